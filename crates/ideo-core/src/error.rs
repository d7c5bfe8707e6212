use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdeError {
    #[error("IO error: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Please save the file before compiling or running it")]
    NotSaved,

    #[error("No file name given for an untitled document")]
    MissingPath,

    #[error("Failed to start shell: {0}")]
    Spawn(String),

    #[error("Process is not running")]
    ProcessNotRunning,

    #[error("No document is open")]
    NoActiveDocument,

    #[error("No document at tab index {0}")]
    InvalidIndex(usize),

    #[error("{} is already open in another tab", .0.display())]
    AlreadyOpen(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl IdeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `Cancelled` is a normal control-flow outcome, not a failure to report.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, IdeError>;
