//! # reqgate protocol
//!
//! Shared data model for the reconciliation pipeline:
//!
//! ```text
//! document ──> RequirementRecord ──┐
//!                                  ├──> JudgeRequest ──> (external judge) ──> JudgeResponse
//! codebase ──> EvidenceItem ───────┘                                              │
//!                                                                                  ▼
//!                                        StatusRecord <── conservative gate <── ProposedStatus
//!                                             │
//!                                             └──> StatusRow (+ milestone) ──> reports
//! ```
//!
//! Evidence is referenced from status records by typed citation strings
//! (`route:GET /api/rides/:id @ src/rides.ts:12`), never by value.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod evidence;
mod judge;
mod requirement;
mod status;

pub use evidence::{EvidenceItem, EvidenceKind, Locator};
pub use judge::{
    judge_response_schema, BatchRequirement, JudgeRequest, JudgeResponse, ProposedStatus,
    UndocumentedFeature,
};
pub use requirement::RequirementRecord;
pub use status::{Status, StatusRecord, StatusRow};

/// Marker appended to text cut by [`truncate_marked`].
pub const TRUNCATION_MARKER: &str = "\n[TRUNCATED]\n";

/// Which scanner cap cut an evidence collection short.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Truncation {
    MaxEndpoints,
    MaxTests,
    MaxUiSurfaces,
    MaxCiWorkflows,
    MaxEvidencePaths,
    MaxSnippets,
    MaxMigrationFiles,
}

impl Truncation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaxEndpoints => "max_endpoints",
            Self::MaxTests => "max_tests",
            Self::MaxUiSurfaces => "max_ui_surfaces",
            Self::MaxCiWorkflows => "max_ci_workflows",
            Self::MaxEvidencePaths => "max_evidence_paths",
            Self::MaxSnippets => "max_snippets",
            Self::MaxMigrationFiles => "max_migration_files",
        }
    }
}

/// Cut `text` to at most `max_chars` characters (char boundary safe).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cut `text` to `max_chars` characters and append [`TRUNCATION_MARKER`] when anything was
/// dropped. Text that already fits is returned unchanged.
pub fn truncate_marked(text: &str, max_chars: usize) -> String {
    let kept = truncate_chars(text, max_chars);
    if kept.len() == text.len() {
        return text.to_string();
    }
    let mut out = String::with_capacity(kept.len() + TRUNCATION_MARKER.len());
    out.push_str(kept);
    out.push_str(TRUNCATION_MARKER);
    out
}
