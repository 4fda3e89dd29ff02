use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvidenceError>;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scan root: {0}")]
    InvalidRoot(String),

    #[error("Invalid scan limits: {0}")]
    InvalidLimits(String),
}

impl EvidenceError {
    pub fn invalid_limits(msg: impl Into<String>) -> Self {
        Self::InvalidLimits(msg.into())
    }
}
