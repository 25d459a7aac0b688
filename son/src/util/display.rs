use crate::error::Error;
use color_print::cprintln;
use std::path::PathBuf;

/// Print an error with its location, in the compiler's diagnostic layout.
pub fn print_diag(err: &Error) {
    cprintln!("<red,bold>error[{}]</>: {}", err.code(), err.kind);
    match (&err.file, err.line) {
        (Some(file), Some(line)) => cprintln!("     <blue>--></> <underline>{}:{}</>", file.display(), line),
        (Some(file), None) => cprintln!("     <blue>--></> <underline>{}</>", file.display()),
        (None, Some(line)) => cprintln!("     <blue>--></> line {}", line),
        (None, None) => {}
    }
}

/// One line per written file, then a count.
pub fn print_summary(written: &[PathBuf]) {
    for path in written {
        cprintln!("  <green>wrote</> {}", path.display());
    }
    cprintln!("<green,bold>done</>: {} file(s)", written.len());
}
