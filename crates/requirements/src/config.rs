use serde::{Deserialize, Serialize};

/// Configuration for turning a document into requirement records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseConfig {
    /// Heading depth of requirement-granularity sections (`###` = 3)
    pub heading_level: usize,

    /// Heading marker character
    pub heading_marker: char,

    /// Identifier namespace token (`BRRS` → `BRRS-2.1`)
    pub namespace: String,

    /// Drop fenced code blocks from section bodies before extraction
    pub strip_code_fences: bool,

    /// Honour explicit identifiers written into headings (`BRRS-0007: Title`)
    pub explicit_ids: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            heading_level: 3,
            heading_marker: '#',
            namespace: "BRRS".to_string(),
            strip_code_fences: true,
            explicit_ids: true,
        }
    }
}

impl ParseConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=6).contains(&self.heading_level) {
            return Err(format!(
                "heading_level ({}) must be between 1 and 6",
                self.heading_level
            ));
        }

        if self.heading_marker.is_whitespace() || self.heading_marker.is_alphanumeric() {
            return Err(format!(
                "heading_marker ({:?}) must be a punctuation character",
                self.heading_marker
            ));
        }

        if self.namespace.is_empty() {
            return Err("namespace must not be empty".to_string());
        }

        if !self
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!(
                "namespace ({}) may only contain ASCII letters, digits, '_' or '-'",
                self.namespace
            ));
        }

        Ok(())
    }
}
