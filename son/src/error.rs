use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

// Unified error kinds for the compiler
#[derive(Debug, Error)]
pub enum ErrorKind {
    // IO and parse errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse source file: {0}")]
    Parse(String),

    #[error("File type not supported: {0}")]
    UnsupportedFile(String),

    // Structural errors on reserved forms
    #[error("Expected identifier, got {0}")]
    ExpectedIdentifier(String),

    #[error("yes()/no() accepts exactly one argument, got {0}")]
    RuleArity(usize),

    #[error("The name of a section must be a string literal")]
    SectionName,

    #[error("section() accepts one or zero arguments, got {0}")]
    SectionArity(usize),

    #[error("The name of a plot must be a string literal")]
    PlotName,

    #[error("plot() accepts one or zero arguments, got {0}")]
    PlotArity(usize),

    #[error("Function declarations are not allowed at the top level of a scenario body")]
    FunctionDeclaration,

    #[error("yes()/no(), plot(), or section() expected here")]
    ExpectedScenario,

    #[error("A property cannot have arguments")]
    PropertyArguments,

    #[error("compute() accepts exactly one identifier argument")]
    ComputeArgument,

    // Uniqueness errors
    #[error("Section name is not unique: {0}")]
    DuplicateSection(String),

    #[error("Plot name is not unique: {0}")]
    DuplicatePlot(String),

    #[error("Parameter name is not unique: {0}")]
    DuplicateParameter(String),

    #[error("Function name is not unique: {0}")]
    DuplicateAlgorithm(String),

    // Semantic errors
    #[error("{0} is not allowed unless relax is enabled")]
    RestrictedConstruct(&'static str),

    #[error("Cannot assign to function or property `{0}`")]
    AssignToAlgorithm(String),

    #[error("compute() expects a property, `{0}` is not one")]
    UnknownProperty(String),

    #[error("A module file must have a module() statement")]
    MissingModule,

    #[error("Only one config object is allowed")]
    DuplicateConfig,

    #[error("Unexpected config value for `{0}`: {1}")]
    ConfigValue(String, String),

    #[error("Unsupported module type: {0}. Allowed values: functions, object")]
    ModuleShape(String),

    #[error("Unsupported output format: {0}. Allowed values: commonjs, es, browser")]
    OutputFormat(String),

    #[error("Unexpected module file in a module subfolder: {0}")]
    NestedModule(String),

    #[error("Several module files in one folder: {0}")]
    SeveralModules(String),

    // Decision tree errors
    #[error("Plots are not mutually exclusive")]
    NotMutuallyExclusive,

    #[error("OTHER must be the last comparison for `{0}`")]
    WildcardNotLast(String),

    #[error("OTHER for `{0}` conflicts with a rule of opposite polarity")]
    WildcardPolarity(String),

    // Dependency errors
    #[error("Detected a cycle in property dependencies: {0}")]
    DependencyCycle(String),

    #[error("Internal error: {0}")]
    Internal(&'static str),
}

impl ErrorKind {
    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Io(_) => "SON0001",
            ErrorKind::Parse(_) => "SON0002",
            ErrorKind::UnsupportedFile(_) => "SON0003",
            ErrorKind::ExpectedIdentifier(_) => "SON0004",
            ErrorKind::RuleArity(_) => "SON0005",
            ErrorKind::SectionName => "SON0006",
            ErrorKind::SectionArity(_) => "SON0007",
            ErrorKind::PlotName => "SON0008",
            ErrorKind::PlotArity(_) => "SON0009",
            ErrorKind::FunctionDeclaration => "SON0010",
            ErrorKind::ExpectedScenario => "SON0011",
            ErrorKind::PropertyArguments => "SON0012",
            ErrorKind::ComputeArgument => "SON0013",
            ErrorKind::DuplicateSection(_) => "SON0014",
            ErrorKind::DuplicatePlot(_) => "SON0015",
            ErrorKind::DuplicateParameter(_) => "SON0016",
            ErrorKind::DuplicateAlgorithm(_) => "SON0017",
            ErrorKind::RestrictedConstruct(_) => "SON0018",
            ErrorKind::AssignToAlgorithm(_) => "SON0019",
            ErrorKind::UnknownProperty(_) => "SON0020",
            ErrorKind::MissingModule => "SON0021",
            ErrorKind::DuplicateConfig => "SON0022",
            ErrorKind::ConfigValue(_, _) => "SON0023",
            ErrorKind::ModuleShape(_) => "SON0024",
            ErrorKind::OutputFormat(_) => "SON0025",
            ErrorKind::NestedModule(_) => "SON0026",
            ErrorKind::SeveralModules(_) => "SON0027",
            ErrorKind::NotMutuallyExclusive => "SON0028",
            ErrorKind::WildcardNotLast(_) => "SON0029",
            ErrorKind::WildcardPolarity(_) => "SON0030",
            ErrorKind::DependencyCycle(_) => "SON0031",
            ErrorKind::Internal(_) => "SON0099",
        }
    }
}

/// A compile error with the nearest known source line and the file it surfaced from.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub line: Option<usize>,
    pub file: Option<PathBuf>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            line: None,
            file: None,
        }
    }

    /// Attach a source line. Line 0 means "unknown" and is ignored.
    pub fn at(kind: ErrorKind, line: usize) -> Self {
        Error {
            kind,
            line: (line > 0).then_some(line),
            file: None,
        }
    }

    /// Attach the originating file unless a deeper layer already did.
    pub fn in_file(mut self, path: &Path) -> Self {
        if self.file.is_none() {
            self.file = Some(path.to_path_buf());
        }
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.kind)?;
        if let Some(line) = self.line {
            write!(f, ". Line {}", line)?;
        }
        if let Some(file) = &self.file {
            write!(f, ". File {}", file.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(e))
    }
}

/// Attach a file path to the error of a result
pub trait InFile<T> {
    fn in_file(self, path: &Path) -> Result<T>;
}

impl<T> InFile<T> for Result<T> {
    fn in_file(self, path: &Path) -> Result<T> {
        self.map_err(|e| e.in_file(path))
    }
}
