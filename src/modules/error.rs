use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while checking user-supplied module names.
///
/// A name that fails here never reaches the filesystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Module name cannot be empty")]
    EmptyName,

    #[error("Module name too long (max {max} chars)")]
    NameTooLong { max: usize },

    #[error("Module name can only contain letters, numbers, hyphens, and underscores")]
    InvalidCharacters { name: String },

    #[error("'{name}' is a reserved system name")]
    ReservedName { name: String },
}

/// Errors raised when a path or file violates the module tree's confinement rules
#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("Path {path} is outside allowed directory {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Symlinks are not allowed: {path}")]
    Symlink { path: PathBuf },

    #[error("{path} exists but is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("File {file} exceeds maximum size ({max_size} bytes)")]
    FileTooLarge { file: String, max_size: u64 },

    #[error("Path validation failed for {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

/// Errors raised when a module's descriptor or entry script is unusable
#[derive(Error, Debug)]
pub enum InvalidModuleError {
    #[error("Module '{module}' is missing meta.json")]
    MissingDescriptor { module: String },

    #[error("Failed to read {file}: {error}")]
    Unreadable {
        file: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Invalid JSON in {file}: {error}")]
    Parse {
        file: PathBuf,
        #[source]
        error: serde_json::Error,
    },

    #[error("Descriptor {file} is not a regular file")]
    NotARegularFile { file: PathBuf },

    #[error("Descriptor {file} must be a JSON object")]
    NotAnObject { file: PathBuf },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Field '{field}' must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Unsupported language: {lang}")]
    UnsupportedLanguage { lang: String },

    #[error("Invalid version format: {version}")]
    InvalidVersion { version: String },

    #[error("Entry script must have {expected} extension for {lang}")]
    ExtensionMismatch {
        expected: &'static str,
        lang: &'static str,
    },

    #[error("Invalid 'args' section: {reason}")]
    InvalidArgs { reason: String },

    #[error("Entry script '{entry}' not found")]
    EntryMissing { entry: String },

    #[error("Path {path} cannot be represented in a shell command")]
    UnrepresentablePath { path: PathBuf },

    #[error("{0}")]
    Oversized(#[source] SecurityError),
}

/// Top-level error for every module operation
#[derive(Error, Debug)]
pub enum FootoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error(transparent)]
    InvalidModule(#[from] InvalidModuleError),

    #[error("Module '{name}' not found (searched: {searched:?})")]
    ModuleNotFound { name: String, searched: Vec<String> },

    #[error("Module '{name}' already exists in {scope} scope")]
    AlreadyExists { name: String, scope: String },

    #[error("Directory initialization failed for {path}: {reason}")]
    Initialization { path: PathBuf, reason: String },

    #[error("I/O error during {operation}: {error}")]
    Io {
        operation: String,
        #[source]
        error: std::io::Error,
    },
}

impl FootoError {
    pub fn io(operation: impl Into<String>, error: std::io::Error) -> Self {
        FootoError::Io {
            operation: operation.into(),
            error,
        }
    }

    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FootoError::Validation(_)
            | FootoError::Security(_)
            | FootoError::InvalidModule(_)
            | FootoError::ModuleNotFound { .. }
            | FootoError::AlreadyExists { .. }
            | FootoError::Initialization { .. }
            | FootoError::Io { .. } => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, FootoError>;
