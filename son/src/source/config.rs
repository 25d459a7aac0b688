use crate::error::{Error, ErrorKind, Result};
use crate::tree::{Kind, Lit, Node, Property};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// How a module exposes its public functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModuleShape {
    #[default]
    Functions,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Commonjs,
    Es,
    #[default]
    Browser,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Es => "mjs",
            OutputFormat::Commonjs | OutputFormat::Browser => "js",
        }
    }

    /// Browser scripts have no import section
    pub fn keeps_header(&self) -> bool {
        !matches!(self, OutputFormat::Browser)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleConfig {
    pub shape: ModuleShape,
    pub format: Option<OutputFormat>, // None: the driver's default
    pub relax: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionConfig {
    pub relax: bool,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyConfig {
    pub lazy: bool,
    pub relax: bool,
    pub fields: Vec<String>,
}

impl ModuleConfig {
    pub fn parse(entries: &[Property], line: usize) -> Result<Self> {
        let mut config = ModuleConfig::default();
        for entry in entries {
            match entry.key.as_str() {
                "type" => {
                    let value = string_value(entry, line)?;
                    config.shape =
                        ModuleShape::from_str(&value).map_err(|_| Error::at(ErrorKind::ModuleShape(value), line))?;
                }
                "format" => {
                    let value = string_value(entry, line)?;
                    let format =
                        OutputFormat::from_str(&value).map_err(|_| Error::at(ErrorKind::OutputFormat(value), line))?;
                    config.format = Some(format);
                }
                "relax" => config.relax = bool_value(entry, line)?,
                _ => return Err(unknown(entry, line)),
            }
        }
        Ok(config)
    }
}

impl FunctionConfig {
    pub fn parse(entries: &[Property], line: usize) -> Result<Self> {
        let mut config = FunctionConfig::default();
        for entry in entries {
            match entry.key.as_str() {
                "relax" => config.relax = bool_value(entry, line)?,
                "fields" => config.fields = string_list(entry, line)?,
                _ => return Err(unknown(entry, line)),
            }
        }
        Ok(config)
    }
}

impl PropertyConfig {
    pub fn parse(entries: &[Property], line: usize) -> Result<Self> {
        let mut config = PropertyConfig::default();
        for entry in entries {
            match entry.key.as_str() {
                "lazy" => config.lazy = bool_value(entry, line)?,
                "relax" => config.relax = bool_value(entry, line)?,
                "fields" => config.fields = string_list(entry, line)?,
                _ => return Err(unknown(entry, line)),
            }
        }
        Ok(config)
    }
}

fn unknown(entry: &Property, line: usize) -> Error {
    Error::at(ErrorKind::ConfigValue(entry.key.clone(), "unknown option".to_string()), line)
}

fn mismatch(entry: &Property, expected: &str, line: usize) -> Error {
    let found = entry.value.kind_name();
    Error::at(
        ErrorKind::ConfigValue(entry.key.clone(), format!("expected {}, got {}", expected, found)),
        line,
    )
}

fn bool_value(entry: &Property, line: usize) -> Result<bool> {
    match &entry.value.kind {
        Kind::Literal { value: Lit::Bool(b) } => Ok(*b),
        _ => Err(mismatch(entry, "a boolean", line)),
    }
}

fn string_value(entry: &Property, line: usize) -> Result<String> {
    match &entry.value.kind {
        Kind::Literal { value: Lit::Str(s) } => Ok(s.clone()),
        _ => Err(mismatch(entry, "a string", line)),
    }
}

/// `["a", "b"]`, also accepting bare identifiers as names
fn string_list(entry: &Property, line: usize) -> Result<Vec<String>> {
    let Kind::Array { elements } = &entry.value.kind else {
        return Err(mismatch(entry, "an array", line));
    };
    elements
        .iter()
        .map(|element| match &element.kind {
            Kind::Literal { value: Lit::Str(s) } => Ok(s.clone()),
            Kind::Identifier { name } => Ok(name.clone()),
            _ => Err(mismatch(entry, "an array of names", line)),
        })
        .collect()
}

/// Split call arguments into parameter names and an optional trailing config object.
pub fn split_arguments(arguments: &[Node], line: usize) -> Result<(Vec<String>, Option<&[Property]>)> {
    let mut params: Vec<String> = Vec::new();
    let mut config = None;
    for argument in arguments {
        match &argument.kind {
            Kind::Object { properties } => {
                if config.replace(properties.as_slice()).is_some() {
                    return Err(Error::at(ErrorKind::DuplicateConfig, line));
                }
            }
            Kind::Identifier { name } => {
                if params.contains(name) {
                    return Err(Error::at(ErrorKind::DuplicateParameter(name.clone()), line));
                }
                params.push(name.clone());
            }
            _ => {
                return Err(Error::at(
                    ErrorKind::ExpectedIdentifier(argument.kind_name().to_string()),
                    line,
                ))
            }
        }
    }
    Ok((params, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build::*;

    fn entries(node: Node) -> Vec<Property> {
        match node.kind {
            Kind::Object { properties } => properties,
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn test_module_config() {
        let config = ModuleConfig::parse(
            &entries(object(vec![("type", text("object")), ("format", text("es")), ("relax", boolean(true))])),
            1,
        )
        .unwrap();
        assert_eq!(config.shape, ModuleShape::Object);
        assert_eq!(config.format, Some(OutputFormat::Es));
        assert!(config.relax);
    }

    #[test]
    fn test_bad_module_type() {
        let err = ModuleConfig::parse(&entries(object(vec![("type", text("class"))])), 3).unwrap_err();
        assert_eq!(err.code(), "SON0024");
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn test_property_config() {
        let config = PropertyConfig::parse(
            &entries(object(vec![
                ("lazy", boolean(true)),
                ("fields", array(vec![text("width"), ident("height")])),
            ])),
            1,
        )
        .unwrap();
        assert!(config.lazy);
        assert!(!config.relax);
        assert_eq!(config.fields, vec!["width", "height"]);
    }

    #[test]
    fn test_config_value_type() {
        let err = FunctionConfig::parse(&entries(object(vec![("relax", text("yes"))])), 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "SON0023: Unexpected config value for `relax`: expected a boolean, got Literal. Line 2"
        );
    }

    #[test]
    fn test_split_arguments() {
        let args = vec![ident("a"), ident("b"), object(vec![("relax", boolean(true))])];
        let (params, config) = split_arguments(&args, 1).unwrap();
        assert_eq!(params, vec!["a", "b"]);
        assert_eq!(config.map(|c| c.len()), Some(1));

        let twice = vec![object(vec![]), object(vec![])];
        assert_eq!(split_arguments(&twice, 1).unwrap_err().code(), "SON0022");
        let repeated = vec![ident("a"), ident("a")];
        assert_eq!(split_arguments(&repeated, 1).unwrap_err().code(), "SON0016");
        let literal = vec![num(1.0)];
        assert_eq!(split_arguments(&literal, 1).unwrap_err().code(), "SON0004");
    }
}
