use crate::error::{Error, ErrorKind, InFile, Result};
use crate::module::{ModuleCompiler, Output, SourceUnit};
use crate::source::config::OutputFormat;
use crate::source::{self, Unit, MODULE_EXTENSION};
use crate::tree::{Node, Printer};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Turns source text into statements.
pub trait SourceParser {
    /// Whether files like `path` are source files at all
    fn accepts(&self, path: &Path) -> bool;

    fn parse(&self, text: &str, path: &Path) -> Result<Vec<Node>>;
}

/// Reads trees serialized as JSON by an external front end: either a bare
/// statement array or a program object with a `body` array.
#[derive(Debug, Clone, Default)]
pub struct JsonTreeParser;

#[derive(Deserialize)]
#[serde(untagged)]
enum Program {
    Body(Vec<Node>),
    Object { body: Vec<Node> },
}

impl JsonTreeParser {
    pub fn new() -> Self {
        JsonTreeParser
    }
}

impl SourceParser for JsonTreeParser {
    fn accepts(&self, path: &Path) -> bool {
        matches!(path.extension().and_then(|e| e.to_str()), Some("json") | Some(MODULE_EXTENSION))
    }

    fn parse(&self, text: &str, path: &Path) -> Result<Vec<Node>> {
        let program: Program = serde_json::from_str(text)
            .map_err(|e| Error::at(ErrorKind::Parse(e.to_string()), e.line()).in_file(path))?;
        Ok(match program {
            Program::Body(body) | Program::Object { body } => body,
        })
    }
}

/// File access of the compiler
pub trait SourceFs {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
    /// Direct children, sorted
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn is_dir(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct DiskFs;

impl SourceFs for DiskFs {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::from(e).in_file(path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::from(e).in_file(parent))?;
        }
        std::fs::write(path, contents).map_err(|e| Error::from(e).in_file(path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)
            .and_then(|dir| dir.map(|entry| entry.map(|e| e.path())).collect::<std::io::Result<Vec<_>>>())
            .map_err(|e| Error::from(e).in_file(path))?;
        entries.sort();
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Files kept in memory. Directories exist implicitly through the files below them.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RefCell<BTreeMap<PathBuf, String>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.files.borrow_mut().insert(path.into(), contents.to_string());
        self
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }
}

impl SourceFs for MemoryFs {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.get(path).ok_or_else(|| {
            let e = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
            Error::from(e).in_file(path)
        })
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.files.borrow_mut().insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.borrow();
        let mut entries: Vec<PathBuf> = files
            .keys()
            .filter_map(|file| file.strip_prefix(path).ok())
            .filter_map(|rest| rest.components().next())
            .map(|first| path.join(first))
            .collect();
        entries.dedup();
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files.borrow().keys().any(|file| file != path && file.starts_with(path))
    }
}

/// The compiler: one input path in, generated files out.
pub struct Son<'a> {
    fs: &'a dyn SourceFs,
    parser: &'a dyn SourceParser,
    printer: &'a dyn Printer,
    format: OutputFormat,
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_module_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MODULE_EXTENSION)
}

impl<'a> Son<'a> {
    pub fn new(fs: &'a dyn SourceFs, parser: &'a dyn SourceParser, printer: &'a dyn Printer) -> Self {
        Son {
            fs,
            parser,
            printer,
            format: OutputFormat::default(),
        }
    }

    /// Output format of modules that do not pick one themselves
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Compile a function file, a module file, or every module under a directory.
    /// Returns the written files.
    pub fn run(&self, input: &Path, output: &Path) -> Result<Vec<PathBuf>> {
        if self.fs.is_dir(input) {
            info!(dir = %input.display(), "directory mode");
            let mut written = Vec::new();
            self.compile_dir(input, output, &mut written)?;
            return Ok(written);
        }
        let result = if is_module_file(input) {
            info!(file = %input.display(), "module mode");
            self.compile_module(input)?
        } else {
            info!(file = %input.display(), "single file mode");
            self.compile_file(input)?
        };
        Ok(vec![self.emit(output, result)?])
    }

    fn emit(&self, output: &Path, result: Output) -> Result<PathBuf> {
        let path = output.join(&result.file_name);
        self.fs.write(&path, &result.text)?;
        info!(file = %path.display(), "written");
        Ok(path)
    }

    fn parse(&self, path: &Path) -> Result<Vec<Node>> {
        let text = self.fs.read_to_string(path)?;
        self.parser.parse(&text, path).in_file(path)
    }

    fn compile_file(&self, path: &Path) -> Result<Output> {
        if !self.parser.accepts(path) {
            return Err(Error::new(ErrorKind::UnsupportedFile(path.display().to_string())).in_file(path));
        }
        match source::classify(&stem(path), self.parse(path)?).in_file(path)? {
            Unit::Function(function) => ModuleCompiler::new(self.printer, self.format).compile_function(function, path),
            Unit::Property(_) | Unit::Other(_) => {
                Err(Error::new(ErrorKind::UnsupportedFile(path.display().to_string())).in_file(path))
            }
        }
    }

    /// Compile the module of `path` from every unit in its folder tree.
    fn compile_module(&self, path: &Path) -> Result<Output> {
        let module = source::module(&stem(path), self.parse(path)?).in_file(path)?;
        let folder = path.parent().unwrap_or(Path::new(""));
        let mut units = Vec::new();
        self.collect_units(folder, path, &mut units)?;
        ModuleCompiler::new(self.printer, self.format)
            .compile(module, units)
            .in_file(path)
    }

    fn collect_units(&self, folder: &Path, module: &Path, units: &mut Vec<SourceUnit>) -> Result<()> {
        for entry in self.fs.read_dir(folder)? {
            if entry == module {
                continue;
            }
            if self.fs.is_dir(&entry) {
                self.collect_units(&entry, module, units)?;
            } else if is_module_file(&entry) && entry.parent() == module.parent() {
                return Err(Error::new(ErrorKind::SeveralModules(folder.display().to_string())).in_file(&entry));
            } else if is_module_file(&entry) {
                return Err(Error::new(ErrorKind::NestedModule(entry.display().to_string())).in_file(&entry));
            } else if self.parser.accepts(&entry) {
                let unit = source::classify(&stem(&entry), self.parse(&entry)?).in_file(&entry)?;
                debug!(file = %entry.display(), name = unit.name().unwrap_or("-"), "collected unit");
                units.push(SourceUnit { path: entry, unit });
            } else {
                debug!(file = %entry.display(), "skipping file");
            }
        }
        Ok(())
    }

    /// A folder with a module file is that module; otherwise look in its subfolders.
    fn compile_dir(&self, dir: &Path, output: &Path, written: &mut Vec<PathBuf>) -> Result<()> {
        let entries = self.fs.read_dir(dir)?;
        let modules: Vec<&PathBuf> = entries
            .iter()
            .filter(|entry| is_module_file(entry) && !self.fs.is_dir(entry))
            .collect();
        match modules.as_slice() {
            [module] => {
                let result = self.compile_module(module)?;
                written.push(self.emit(output, result)?);
            }
            [] => {
                for entry in entries.iter().filter(|entry| self.fs.is_dir(entry)) {
                    let name = entry.file_name().map(PathBuf::from).unwrap_or_default();
                    self.compile_dir(entry, &output.join(name), written)?;
                }
            }
            _ => return Err(Error::new(ErrorKind::SeveralModules(dir.display().to_string())).in_file(dir)),
        }
        Ok(())
    }
}
