use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Errors that can occur in the logging library
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation on the active log file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The log file or its directory could not be prepared.
    #[error("Configuration error for {}: {source}", path.display())]
    Config {
        /// Path that could not be created, opened or inspected.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The log file could not be reopened after a rotation.
    #[error("Cannot reopen {} after rotation: {source}", path.display())]
    Reopen {
        /// Path of the file that should have become current.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A configuration value could not be interpreted.
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
    /// A logging call panicked; the panic was contained.
    #[error("Logging call panicked: {0}")]
    Panic(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
}

impl Error {
    pub(crate) fn config(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Config {
            path: path.into(),
            source,
        }
    }

    /// Re-label an open failure that happened while rotating.
    pub(crate) fn into_reopen(self) -> Self {
        match self {
            Self::Config { path, source } => Self::Reopen { path, source },
            other => other,
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            other => std::io::Error::other(other),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
