pub mod build;
pub mod node;
pub mod printer;

pub use node::{DeclKind, Declarator, Function, FunctionForm, Kind, Lit, Node, Property, SwitchCase};
pub use printer::{JsPrinter, Printer};
