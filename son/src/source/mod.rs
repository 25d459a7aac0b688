//! Recognizes what a parsed file declares from its leading reserved call:
//! `fun(..)` / `pfun(..)` functions, `prop(..)` properties, the `module(..)`
//! statement of a `.son` file, or plain code passed through verbatim.

pub mod config;

use crate::error::{Error, ErrorKind, Result};
use crate::tree::Node;
use config::{split_arguments, FunctionConfig, ModuleConfig, PropertyConfig};

/// Extension of module files
pub const MODULE_EXTENSION: &str = "son";

#[derive(Debug, Clone)]
pub struct FunctionUnit {
    pub name: String,
    pub private: bool,
    pub params: Vec<String>,
    pub config: FunctionConfig,
    pub body: Vec<Node>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct PropertyUnit {
    pub name: String,
    pub config: PropertyConfig,
    pub body: Vec<Node>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum Unit {
    Function(FunctionUnit),
    Property(PropertyUnit),
    Other(Vec<Node>),
}

impl Unit {
    /// Algorithm name, if the unit declares one
    pub fn name(&self) -> Option<&str> {
        match self {
            Unit::Function(f) => Some(&f.name),
            Unit::Property(p) => Some(&p.name),
            Unit::Other(_) => None,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Unit::Function(f) => f.line,
            Unit::Property(p) => p.line,
            Unit::Other(_) => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleUnit {
    pub name: String,
    pub params: Vec<String>,
    pub config: ModuleConfig,
    pub header: Vec<Node>, // before module()
    pub body: Vec<Node>,   // after module()
}

enum Header {
    Function {
        private: bool,
        params: Vec<String>,
        config: FunctionConfig,
    },
    Property(PropertyConfig),
}

/// Classify a file named `name` (its stem) by its first statement.
pub fn classify(name: &str, mut body: Vec<Node>) -> Result<Unit> {
    let header = match body.first() {
        Some(first) => read_header(first)?,
        None => None,
    };
    let Some(header) = header else {
        return Ok(Unit::Other(body));
    };

    let line = body.remove(0).line;
    let name = name.to_string();
    Ok(match header {
        Header::Function {
            private,
            params,
            config,
        } => Unit::Function(FunctionUnit {
            name,
            private,
            params,
            config,
            body,
            line,
        }),
        Header::Property(config) => Unit::Property(PropertyUnit {
            name,
            config,
            body,
            line,
        }),
    })
}

fn read_header(first: &Node) -> Result<Option<Header>> {
    let line = first.line;
    let header = match first.reserved_call() {
        Some((call @ ("fun" | "pfun"), arguments)) => {
            let (params, config) = split_arguments(arguments, line)?;
            Header::Function {
                private: call == "pfun",
                params,
                config: config
                    .map(|entries| FunctionConfig::parse(entries, line))
                    .transpose()?
                    .unwrap_or_default(),
            }
        }
        Some(("prop", arguments)) => {
            let (params, config) = split_arguments(arguments, line)?;
            if !params.is_empty() {
                return Err(Error::at(ErrorKind::PropertyArguments, line));
            }
            Header::Property(
                config
                    .map(|entries| PropertyConfig::parse(entries, line))
                    .transpose()?
                    .unwrap_or_default(),
            )
        }
        _ => return Ok(None),
    };
    Ok(Some(header))
}

/// Split a module file at its `module(..)` statement.
pub fn module(name: &str, mut body: Vec<Node>) -> Result<ModuleUnit> {
    let position = body
        .iter()
        .position(|stmt| matches!(stmt.reserved_call(), Some(("module", _))))
        .ok_or(Error::new(ErrorKind::MissingModule))?;
    let rest = body.split_off(position + 1);

    let statement = &body[position];
    let line = statement.line;
    let arguments = statement.reserved_call().map_or(&[][..], |(_, arguments)| arguments);
    let (params, config) = split_arguments(arguments, line)?;
    let config = config
        .map(|entries| ModuleConfig::parse(entries, line))
        .transpose()?
        .unwrap_or_default();

    body.truncate(position);
    Ok(ModuleUnit {
        name: name.to_string(),
        params,
        config,
        header: body,
        body: rest,
    })
}
