//! # reqgate requirements
//!
//! Structural parser for semi-structured requirement documents.
//!
//! ## Pipeline
//!
//! ```text
//! Document text
//!     │
//!     ├──> Sectioner (ATX headings at one depth, fence aware)
//!     │      └─> Section { title, body, line }
//!     │
//!     └──> Extractor
//!            ├─> identifier: explicit id │ dotted section prefix │ positional fallback
//!            ├─> clean title, normalised description
//!            └─> acceptance criteria (labelled block, else Given/When/Then lines)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use reqgate_requirements::{ParseConfig, RequirementExtractor};
//!
//! let doc = "### 2.1 Rider signup\nAcceptance:\n- Email verified\n- Phone optional\n";
//! let records = RequirementExtractor::new(ParseConfig::default())
//!     .extract(doc, "Requirements/canonical.md")
//!     .unwrap();
//!
//! assert_eq!(records[0].requirement_id, "BRRS-2.1");
//! assert_eq!(records[0].acceptance_criteria.len(), 2);
//! ```

mod acceptance;
mod config;
mod error;
mod extractor;
mod quality;
mod sectioner;

pub use acceptance::extract_acceptance;
pub use config::ParseConfig;
pub use error::{RequirementsError, Result};
pub use extractor::RequirementExtractor;
pub use quality::{MissingCriteria, QualityReport};
pub use sectioner::{split_sections, Section, SectionerOptions};
