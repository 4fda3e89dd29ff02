use std::path::PathBuf;
use thiserror::Error;

/// Result type for reporting operations
pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A status JSONL line that does not decode as a status row
    #[error("{path}:{line}: malformed status row: {message}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ReportError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
