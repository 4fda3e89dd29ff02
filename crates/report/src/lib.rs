//! # reqgate report
//!
//! Rolls committed status records up into milestones and writes the run's artifacts.
//!
//! ```text
//! StatusRecord ──> MilestoneClassifier ──> StatusRow
//!                                             │
//!                     CompletionPolicy ──> aggregate() ──> ReportSummary
//!                                             │
//!                                             ▼
//!                                      ArtifactWriter (jsonl, md, run_metadata.json)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use reqgate_protocol::{Status, StatusRecord, StatusRow};
//! use reqgate_report::{aggregate, CompletionPolicy, MilestoneClassifier};
//!
//! let classifier = MilestoneClassifier::default();
//! let mut record = StatusRecord::seed("BRRS-2.1", "Rider signup");
//! record.status = Status::Tested;
//! let row = StatusRow::from_record(&record, classifier.classify(&record.title, ""));
//!
//! let summary = aggregate(&[row], &CompletionPolicy::KeywordFallback);
//! assert_eq!(summary.milestones[0].milestone, "Rider App");
//! assert_eq!(summary.complete, 1);
//! ```

mod aggregate;
pub mod artifacts;
mod error;
mod milestone;
mod render;
mod taxonomy;

pub use aggregate::{aggregate, MilestoneAggregate, ReportSummary};
pub use artifacts::{read_status_rows, write_jsonl, ArtifactWriter, RunMetadata, SourceDocument};
pub use error::{ReportError, Result};
pub use milestone::{builtin_rules, MilestoneClassifier, MilestoneRule, DEFAULT_MILESTONE};
pub use render::{render_milestone_summary, render_status_markdown, render_undocumented};
pub use taxonomy::{CompletionPolicy, FALLBACK_KEYWORDS};
