use thiserror::Error;

/// Result type for requirement parsing
pub type Result<T> = std::result::Result<T, RequirementsError>;

/// Errors that abort a parse. There is no degraded mode: identifiers depend on a
/// correctly shaped document.
#[derive(Error, Debug)]
pub enum RequirementsError {
    /// The document has no headings at the requirement depth
    #[error(
        "expected '{marker}' headings at level {level} but found none; showing first lines of the document:\n{preview}"
    )]
    NoHeadings {
        level: usize,
        marker: String,
        preview: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RequirementsError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
