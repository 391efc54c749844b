use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the dispatch core. Every failure is returned to the
/// immediate caller; nothing is retried or replaced by a fallback.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Unsupported strategy, invalid strategy parameters, or a requested
    /// parameter load that failed during construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Malformed round snapshot or transition record.
    #[error("data error: {0}")]
    Data(String),

    #[error("no valid policy parameters at {path}: {reason}")]
    NotFound { path: PathBuf, reason: String },

    #[error("failed to write policy parameters to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    pub fn data(message: impl Into<String>) -> Self {
        DispatchError::Data(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        DispatchError::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
