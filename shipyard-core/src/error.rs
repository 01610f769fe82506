//! Error types for shipyard core operations

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required credential is not set
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Git remote URL in a form we do not recognize
    #[error("Unrecognized git remote URL format: {0}")]
    UnrecognizedRemote(String),

    /// Pre-flight validation failed before any side effect
    #[error("Validation failed: {0}")]
    Validation(String),

    /// External command exited with a failure status
    #[error("Command `{program}` failed with status {status}: {stderr}")]
    Command {
        program: String,
        status: i32,
        stderr: String,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
