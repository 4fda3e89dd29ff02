use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A canonical, identifier-bearing unit derived from one document section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct RequirementRecord {
    /// Stable identifier (`BRRS-2.1`, or the positional fallback `BRRS-0004`)
    pub requirement_id: String,

    /// Dotted numeric prefix of the heading, when present
    pub section_number: Option<String>,

    /// Heading text with the numeric prefix removed
    pub title: String,

    /// Normalised section body
    pub description: String,

    /// Acceptance criteria lines, in document order
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,

    /// Quality signal: no acceptance criteria could be extracted
    #[serde(default)]
    pub missing_acceptance_criteria: bool,

    /// Path of the document the record was parsed from
    pub source_file: String,
}

impl RequirementRecord {
    /// Lower-cased `title + " " + description`, the text keyword rules match against.
    #[must_use]
    pub fn keyword_blob(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}
