pub mod graph;

use crate::compile::scope::{
    collect_declarations, scope_body, suspend_computes, AlgorithmKind, Algorithms, VariableContext,
};
use crate::compile::{aggregate_name, calculator_name, compile_body};
use crate::error::{Error, ErrorKind, InFile, Result};
use crate::source::config::{ModuleConfig, ModuleShape, OutputFormat};
use crate::source::{FunctionUnit, ModuleUnit, Unit};
use crate::tree::{build, Function, FunctionForm, Kind, Node, Printer};
use graph::{DependencyGraph, Resolution, Vertex};
use indexmap::IndexSet;
use itertools::Itertools;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A unit together with the file it was read from
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub unit: Unit,
}

/// One generated file
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub file_name: String,
    pub text: String,
}

/// Algorithm compiled on its own, before the module-wide fix-ups
struct Compiled {
    name: String,
    path: PathBuf,
    line: usize,
    params: Vec<String>,
    private: bool,
    property: bool,
    own_suspends: bool,
    body: Vec<Node>,
}

pub struct ModuleCompiler<'p> {
    printer: &'p dyn Printer,
    format: OutputFormat,
}

impl<'p> ModuleCompiler<'p> {
    /// `format` applies where the module does not configure one.
    pub fn new(printer: &'p dyn Printer, format: OutputFormat) -> Self {
        ModuleCompiler { printer, format }
    }

    /// A single function file, emitted like a module holding only that function.
    pub fn compile_function(&self, function: FunctionUnit, path: &Path) -> Result<Output> {
        let module = ModuleUnit {
            name: function.name.clone(),
            params: Vec::new(),
            config: ModuleConfig::default(),
            header: Vec::new(),
            body: Vec::new(),
        };
        let unit = SourceUnit {
            path: path.to_path_buf(),
            unit: Unit::Function(function),
        };
        self.compile(module, vec![unit])
    }

    pub fn compile(&self, module: ModuleUnit, units: Vec<SourceUnit>) -> Result<Output> {
        let format = module.config.format.unwrap_or(self.format);
        info!(module = %module.name, units = units.len(), %format, "compiling module");

        // Every name is known before any body is transformed
        let mut algorithms = Algorithms::new();
        for source in &units {
            let kind = match &source.unit {
                Unit::Function(_) => AlgorithmKind::Function,
                Unit::Property(p) => AlgorithmKind::Property { lazy: p.config.lazy },
                Unit::Other(_) => continue,
            };
            let name = source.unit.name().unwrap_or_default().to_string();
            if algorithms.insert(name.clone(), kind).is_some() {
                return Err(Error::at(ErrorKind::DuplicateAlgorithm(name), source.unit.line()).in_file(&source.path));
            }
        }

        let mut module_ctx = VariableContext::new(&algorithms).relaxed(module.config.relax);
        module_ctx.declared.extend(module.params.iter().cloned());
        module_ctx.declared.extend(collect_declarations(&module.body));
        let module_body = scope_body(module.body, &mut module_ctx)?;

        let mut graph = DependencyGraph::new();
        let mut compiled = Vec::new();
        let mut others = Vec::new();
        let mut active: IndexSet<String> = module_ctx.computes.clone();
        for SourceUnit { path, unit } in units {
            let (name, line, params, private, relax, fields, kind, body) = match unit {
                Unit::Other(body) => {
                    others.push(body);
                    continue;
                }
                Unit::Function(f) => (
                    f.name,
                    f.line,
                    f.params,
                    f.private,
                    f.config.relax,
                    f.config.fields,
                    AlgorithmKind::Function,
                    f.body,
                ),
                Unit::Property(p) => (
                    p.name,
                    p.line,
                    Vec::new(),
                    true,
                    p.config.relax,
                    p.config.fields,
                    AlgorithmKind::Property { lazy: p.config.lazy },
                    p.body,
                ),
            };
            debug!(algorithm = %name, file = %path.display(), "compiling algorithm");

            let own = params.iter().cloned().chain(collect_declarations(&body));
            let mut ctx = module_ctx
                .child(own)
                .relaxed(relax)
                .with_fields(fields)
                .compiling(&name);
            let body = compile_body(body, &mut ctx, self.printer).in_file(&path)?;
            let VariableContext {
                deps,
                computes,
                suspends,
                ..
            } = ctx;

            active.extend(computes.iter().cloned());
            graph.add(
                &name,
                Vertex {
                    kind,
                    suspends,
                    deps,
                    computes,
                    file: path.clone(),
                },
            );
            compiled.push(Compiled {
                name,
                path,
                line,
                params,
                private,
                property: kind != AlgorithmKind::Function,
                own_suspends: suspends,
                body,
            });
        }

        let resolution = graph.resolve()?;
        let awaits = |property: &str| resolution.aggregate_suspends(property);

        let (module_body, _) = suspend_computes(module_body, &awaits)?;
        let mut functions = Vec::new();
        let mut calculators = Vec::new();
        for unit in compiled {
            let (body, found) = suspend_computes(unit.body, &awaits).in_file(&unit.path)?;
            let is_async = unit.own_suspends || found;
            if unit.property {
                let name = calculator_name(&unit.name);
                calculators.push(declare_function(&name, unit.params, body, is_async, unit.line));
            } else {
                let node = declare_function(&unit.name, unit.params, body, is_async, unit.line);
                functions.push((node, (!unit.private).then_some(unit.name)));
            }
        }
        for property in &active {
            functions.push((aggregate(property, &resolution), None));
        }
        let properties: Vec<&str> = algorithms
            .iter()
            .filter(|(_, kind)| **kind != AlgorithmKind::Function)
            .map(|(name, _)| name.as_str())
            .collect();

        let layout = Layout {
            name: module.name,
            params: module.params,
            shape: module.config.shape,
            format,
            header: module.header,
            body: module_body,
            properties,
            others,
            functions,
            calculators,
        };
        Ok(Output {
            file_name: format!("{}.{}", layout.name, format.extension()),
            text: layout.render(self.printer),
        })
    }
}

fn declare_function(name: &str, params: Vec<String>, body: Vec<Node>, is_async: bool, line: usize) -> Node {
    Node::new(
        Kind::Function(Function {
            name: Some(name.to_string()),
            params,
            body,
            is_async,
            form: FunctionForm::Declaration,
        }),
        line,
    )
}

/// `__compute_all_p()`: recompute p and what it eagerly reads, in order.
fn aggregate(property: &str, resolution: &Resolution) -> Node {
    let mut body: Vec<Node> = resolution
        .eager
        .get(property)
        .into_iter()
        .flatten()
        .map(|q| {
            let mut value = build::call_named(&calculator_name(q), vec![]);
            if resolution.suspends(q) {
                value = build::awaited(value);
            }
            build::stmt(build::assign(build::ident(q), value))
        })
        .collect();
    body.push(build::ret(Some(build::ident(property))));
    let is_async = resolution.aggregate_suspends(property);
    declare_function(&aggregate_name(property), Vec::new(), body, is_async, 0)
}

/// Everything that goes into one output file, in output order.
struct Layout<'a> {
    name: String,
    params: Vec<String>,
    shape: ModuleShape,
    format: OutputFormat,
    header: Vec<Node>,
    body: Vec<Node>,
    properties: Vec<&'a str>,
    others: Vec<Vec<Node>>,
    functions: Vec<(Node, Option<String>)>, // exported name of public functions
    calculators: Vec<Node>,
}

impl Layout<'_> {
    fn exports(&self) -> Vec<&str> {
        self.functions
            .iter()
            .filter_map(|(_, export)| export.as_deref())
            .sorted()
            .collect()
    }

    fn export_object(&self) -> Node {
        build::object(self.exports().into_iter().map(|name| (name, build::ident(name))).collect())
    }

    fn render(self, printer: &dyn Printer) -> String {
        let mut chunks: Vec<String> = Vec::new();
        if self.format.keeps_header() && !self.header.is_empty() {
            chunks.push(printer.print_body(&self.header));
        }

        let mut items: Vec<(Node, bool)> = self.body.iter().cloned().map(|n| (n, false)).collect();
        if !self.properties.is_empty() {
            items.push((build::declare(self.properties.iter().copied()), false));
        }
        items.extend(self.others.iter().flatten().cloned().map(|n| (n, false)));
        items.extend(self.functions.iter().map(|(n, export)| (n.clone(), export.is_some())));
        items.extend(self.calculators.iter().cloned().map(|n| (n, false)));

        match self.shape {
            ModuleShape::Object => {
                let mut body: Vec<Node> = items.into_iter().map(|(n, _)| n).collect();
                body.push(build::ret(Some(self.export_object())));
                let params: Vec<&str> = self.params.iter().map(String::as_str).collect();
                chunks.push(printer.print(&build::function(&self.name, &params, body)));
                if self.format == OutputFormat::Commonjs {
                    chunks.push(printer.print(&module_exports(build::ident(&self.name))));
                }
            }
            ModuleShape::Functions => {
                for (node, exported) in &items {
                    let text = printer.print(node);
                    if *exported && self.format == OutputFormat::Es {
                        chunks.push(format!("export {}", text));
                    } else {
                        chunks.push(text);
                    }
                }
                if self.format == OutputFormat::Commonjs && !self.exports().is_empty() {
                    chunks.push(printer.print(&module_exports(self.export_object())));
                }
            }
        }

        let mut text = chunks.join("\n\n");
        text.push('\n');
        text
    }
}

/// `module.exports = value;`
fn module_exports(value: Node) -> Node {
    build::stmt(build::assign(build::member(build::ident("module"), "exports"), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::config::{FunctionConfig, PropertyConfig};
    use crate::source::PropertyUnit;
    use crate::tree::build::*;
    use crate::tree::JsPrinter;

    fn function_unit(name: &str, params: &[&str], private: bool, body: Vec<Node>) -> SourceUnit {
        SourceUnit {
            path: PathBuf::from(format!("{}.json", name)),
            unit: Unit::Function(FunctionUnit {
                name: name.to_string(),
                private,
                params: params.iter().map(|p| p.to_string()).collect(),
                config: FunctionConfig::default(),
                body,
                line: 1,
            }),
        }
    }

    fn module_unit(shape: ModuleShape, format: OutputFormat) -> ModuleUnit {
        ModuleUnit {
            name: "calc".to_string(),
            params: Vec::new(),
            config: ModuleConfig {
                shape,
                format: Some(format),
                relax: false,
            },
            header: vec![var("lib", call_named("require", vec![text("lib")]))],
            body: Vec::new(),
        }
    }

    fn units() -> Vec<SourceUnit> {
        vec![
            function_unit("sub", &["a", "b"], false, vec![ret(Some(binary("-", ident("a"), ident("b"))))]),
            function_unit("add", &["a", "b"], false, vec![ret(Some(binary("+", ident("a"), ident("b"))))]),
            function_unit("twice", &["a"], true, vec![ret(Some(call_named("add", vec![ident("a"), ident("a")])))]),
        ]
    }

    #[test]
    fn test_commonjs_functions_shape() {
        let printer = JsPrinter::new();
        let compiler = ModuleCompiler::new(&printer, OutputFormat::Browser);
        let output = compiler
            .compile(module_unit(ModuleShape::Functions, OutputFormat::Commonjs), units())
            .unwrap();
        assert_eq!(output.file_name, "calc.js");
        assert!(output.text.starts_with("var lib = require(\"lib\");\n\nfunction sub(a, b) {"));
        assert!(output.text.ends_with("module.exports = {\n    add: add,\n    sub: sub\n};\n"));
    }

    #[test]
    fn test_es_exports_public_functions_only() {
        let printer = JsPrinter::new();
        let compiler = ModuleCompiler::new(&printer, OutputFormat::Browser);
        let output = compiler
            .compile(module_unit(ModuleShape::Functions, OutputFormat::Es), units())
            .unwrap();
        assert_eq!(output.file_name, "calc.mjs");
        assert!(output.text.contains("export function add(a, b) {"));
        assert!(output.text.contains("\nfunction twice(a) {"));
        assert!(!output.text.contains("export function twice"));
    }

    #[test]
    fn test_browser_object_shape() {
        let printer = JsPrinter::new();
        let compiler = ModuleCompiler::new(&printer, OutputFormat::Browser);
        let output = compiler
            .compile(module_unit(ModuleShape::Object, OutputFormat::Browser), units())
            .unwrap();
        assert!(output.text.starts_with("function calc() {\n    function sub(a, b) {"));
        assert!(output.text.contains("    return {\n        add: add,\n        sub: sub\n    };\n}"));
        assert!(!output.text.contains("require"));
        assert!(!output.text.contains("module.exports"));
    }

    #[test]
    fn test_duplicate_algorithm() {
        let printer = JsPrinter::new();
        let compiler = ModuleCompiler::new(&printer, OutputFormat::Browser);
        let mut units = units();
        units.push(function_unit("add", &[], false, vec![]));
        let err = compiler
            .compile(module_unit(ModuleShape::Functions, OutputFormat::Es), units)
            .unwrap_err();
        assert_eq!(err.code(), "SON0017");
        assert_eq!(err.file.as_deref(), Some(Path::new("add.json")));
    }

    #[test]
    fn test_property_declared_and_calculated() {
        let printer = JsPrinter::new();
        let compiler = ModuleCompiler::new(&printer, OutputFormat::Browser);
        let property = SourceUnit {
            path: PathBuf::from("answer.json"),
            unit: Unit::Property(PropertyUnit {
                name: "answer".to_string(),
                config: PropertyConfig::default(),
                body: vec![ret(Some(num(42.0)))],
                line: 1,
            }),
        };
        let output = compiler
            .compile(module_unit(ModuleShape::Functions, OutputFormat::Browser), vec![property])
            .unwrap();
        assert_eq!(output.text, "var answer;\n\nfunction __compute_answer() {\n    return 42;\n}\n");
    }
}
