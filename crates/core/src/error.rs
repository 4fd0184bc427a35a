//! Error types for zbot
//!
//! One enum covers store, kernel and configuration failures, so handlers can
//! use `?` across store and kernel calls.

use std::io;
use thiserror::Error;

/// Result type alias for zbot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for zbot
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// No working directory has been configured for the store
    #[error("Store unconfigured: no working directory set")]
    StoreUnconfigured,

    /// A type name that no registered factory can construct
    #[error("No such type: {0}")]
    NoSuchType(String),

    /// A path that does not have the `<type>/<id>/<date>/<time>` shape
    #[error("Invalid version path: {0}")]
    InvalidPath(String),

    /// Unreadable or invalid configuration file
    #[error("Config error: {0}")]
    ConfigError(String),

    /// A module name that is not present in the module catalog
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    /// Failure reported by a command handler
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl Error {
    /// Build a command failure from anything printable.
    pub fn command(msg: impl Into<String>) -> Self {
        Error::CommandFailed(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

/// Render an error and its source chain on a single line.
pub fn error_line(err: &(dyn std::error::Error + 'static)) -> String {
    let mut line = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        line.push_str(": ");
        line.push_str(&cause.to_string());
        source = cause.source();
    }
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
