//! Error types for the slime-marl crate

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the slime-marl crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("observation has {got} features, state encoder expects {expected}")]
    StateEncoding { expected: usize, got: usize },

    #[error("invalid turn order: {message}")]
    InvalidTurnOrder { message: String },

    #[error("environment failure: {0}")]
    Environment(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to write summary row to '{}' after {attempts} attempts: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        attempts: usize,
        #[source]
        source: csv::Error,
    },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

impl Error {
    /// Wrap a failure raised by an environment collaborator.
    pub fn environment<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Environment(source.into())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub(crate) fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
