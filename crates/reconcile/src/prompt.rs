use crate::config::ReconcileConfig;
use reqgate_evidence::{render_digest, render_snippets, ScanReport};
use reqgate_protocol::{truncate_marked, BatchRequirement, JudgeRequest, RequirementRecord};

const EVIDENCE_RULES: &str = "\
STRICT EVIDENCE RULES (non-negotiable):
- Be conservative. If you cannot cite explicit evidence from the digest or snippets, do NOT mark Implemented/Tested.
- Evidence must be concrete and typed with prefixes:
  - route:METHOD PATH @ file:line
  - db:table.column @ file:line
  - test:framework file:line (test name)
  - ui:path
  - ci:workflow
  - file:path
- If status=Tested, include at least one test: evidence.
- Only update requirement_id values in this batch.
- Allowed statuses: Not Started, In Progress, Implemented, Tested, Blocked.
";

const UNDOCUMENTED_WANTED: &str = "Also identify implemented features NOT covered by the requirements, using ONLY evidence in the digest/snippets.\n";
const UNDOCUMENTED_EMPTY: &str = "implemented_not_documented MUST be an empty array for this call.\n";

/// Scan-derived text shared by every batch of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceContext {
    pub digest: String,
    pub snippets: String,
}

impl EvidenceContext {
    pub fn new(digest: impl Into<String>, snippets: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            snippets: snippets.into(),
        }
    }

    pub fn from_scan(report: &ScanReport, document: &str) -> Self {
        Self::new(render_digest(report, document), render_snippets(report))
    }
}

pub fn instructions(include_undocumented: bool) -> String {
    let mut text = String::from(EVIDENCE_RULES);
    text.push('\n');
    text.push_str(if include_undocumented {
        UNDOCUMENTED_WANTED
    } else {
        UNDOCUMENTED_EMPTY
    });
    text
}

pub(crate) fn build_request(
    batch: &[RequirementRecord],
    context: &EvidenceContext,
    config: &ReconcileConfig,
    include_undocumented: bool,
) -> JudgeRequest {
    JudgeRequest {
        instructions: instructions(include_undocumented),
        requirements: batch
            .iter()
            .map(|r| BatchRequirement::from_record(r, config.description_max_chars))
            .collect(),
        evidence_digest: truncate_marked(&context.digest, config.digest_max_chars),
        snippets: truncate_marked(&context.snippets, config.snippets_max_chars),
        include_undocumented,
    }
}
