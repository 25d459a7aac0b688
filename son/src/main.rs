use clap::Parser;
use son::util::display::{print_diag, print_summary};
use son::{DiskFs, JsPrinter, JsonTreeParser, OutputFormat, Son};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, clap::Parser)]
#[clap(author, version, about)]
struct Args {
    /// Function file, module file (.son), or directory of modules
    input: PathBuf,

    /// Output directory
    #[clap(short, long, default_value = ".")]
    output: PathBuf,

    /// Output format of modules that do not configure one (commonjs, es, browser)
    #[clap(short, long, default_value = "browser")]
    format: OutputFormat,

    /// Enable verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "warn,son=debug" } else { "warn,son=info" })
    });
    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let fs = DiskFs;
    let parser = JsonTreeParser::new();
    let printer = JsPrinter::new();
    let son = Son::new(&fs, &parser, &printer).format(args.format);

    match son.run(&args.input, &args.output) {
        Ok(written) => print_summary(&written),
        Err(err) => {
            print_diag(&err);
            std::process::exit(1);
        }
    }
}
