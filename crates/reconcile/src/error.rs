use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Failure talking to, or understanding, the external judge.
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("Judge transport failed: {0}")]
    Transport(String),

    #[error("Malformed judge response: {0}")]
    Malformed(String),

    #[error("Replay judge exhausted after {served} responses")]
    Exhausted { served: usize },
}

impl JudgeError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Batches are 0-based; earlier batches stay committed.
    #[error("Judge failed on batch {batch}: {source}")]
    Judge {
        batch: usize,
        #[source]
        source: JudgeError,
    },

    #[error("Invalid reconcile config: {0}")]
    InvalidConfig(String),
}

impl ReconcileError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
