pub mod compile;
pub mod driver;
pub mod error;
pub mod module;
pub mod source;
pub mod tree;
pub mod util;

pub use driver::{DiskFs, JsonTreeParser, MemoryFs, Son, SourceFs, SourceParser};
pub use error::{Error, ErrorKind, Result};
pub use source::config::{ModuleShape, OutputFormat};
pub use tree::{JsPrinter, Node, Printer};
