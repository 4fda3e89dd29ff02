//! Conservative evidence gate.
//!
//! Every status the judge proposes is checked here before it reaches the ledger:
//!
//! 1. `Implemented` / `Tested` with no evidence becomes `Blocked`.
//! 2. `Tested` without a `test:` citation becomes `Blocked`. Evaluated on the status left
//!    by rule 1.
//!
//! The gate only looks at citation shape. It does not check that the cited artifact
//! actually relates to the requirement.

use reqgate_protocol::{EvidenceKind, ProposedStatus, Status, StatusRecord};

pub const NO_EVIDENCE_GAP: &str = "No concrete evidence provided; cannot mark Implemented/Tested.";
pub const NO_TEST_EVIDENCE_GAP: &str = "Status=Tested requires at least one test: evidence item.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRule {
    NoEvidence,
    TestedWithoutTest,
}

impl GateRule {
    pub const fn gap(self) -> &'static str {
        match self {
            Self::NoEvidence => NO_EVIDENCE_GAP,
            Self::TestedWithoutTest => NO_TEST_EVIDENCE_GAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub record: StatusRecord,
    /// Status the judge asked for, before any downgrade
    pub proposed: Status,
    pub fired: Option<GateRule>,
}

impl GateOutcome {
    pub fn downgraded(&self) -> bool {
        self.fired.is_some()
    }
}

/// Gate-check one proposal. Blank citations are discarded before the checks.
pub fn apply(proposed: ProposedStatus, title: &str) -> GateOutcome {
    let requested = proposed.status;
    let mut record = StatusRecord {
        requirement_id: proposed.requirement_id,
        title: title.to_string(),
        status: proposed.status,
        evidence: proposed
            .evidence
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
        gaps: proposed.gaps,
        notes: proposed.notes,
    };

    let mut fired = None;
    if record.status.claims_done() && record.evidence.is_empty() {
        fired = Some(GateRule::NoEvidence);
        block(&mut record, GateRule::NoEvidence);
    }
    if record.status == Status::Tested && !record.has_evidence_of(EvidenceKind::Test) {
        fired = Some(GateRule::TestedWithoutTest);
        block(&mut record, GateRule::TestedWithoutTest);
    }

    if let Some(rule) = fired {
        log::debug!(
            "Gate downgraded {} from {requested} to Blocked ({rule:?})",
            record.requirement_id
        );
    }
    GateOutcome {
        record,
        proposed: requested,
        fired,
    }
}

fn block(record: &mut StatusRecord, rule: GateRule) {
    record.status = Status::Blocked;
    let gap = rule.gap();
    if !record.gaps.iter().any(|g| g == gap) {
        record.gaps.push(gap.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn proposal(status: Status, evidence: &[&str]) -> ProposedStatus {
        ProposedStatus {
            requirement_id: "BRRS-2.1".to_string(),
            status,
            evidence: evidence.iter().map(|e| (*e).to_string()).collect(),
            gaps: Vec::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn implemented_without_evidence_is_blocked() {
        let outcome = apply(proposal(Status::Implemented, &[]), "Rider signup");
        assert_eq!(outcome.record.status, Status::Blocked);
        assert_eq!(outcome.record.gaps, vec![NO_EVIDENCE_GAP]);
        assert_eq!(outcome.fired, Some(GateRule::NoEvidence));
        assert_eq!(outcome.proposed, Status::Implemented);
    }

    #[test]
    fn tested_with_only_file_evidence_is_blocked() {
        let outcome = apply(
            proposal(Status::Tested, &["file:src/signup.ts"]),
            "Rider signup",
        );
        assert_eq!(outcome.record.status, Status::Blocked);
        assert_eq!(outcome.record.gaps, vec![NO_TEST_EVIDENCE_GAP]);
        assert_eq!(outcome.record.evidence, vec!["file:src/signup.ts"]);
    }

    #[test]
    fn tested_with_test_citation_passes() {
        let outcome = apply(
            proposal(
                Status::Tested,
                &["route:POST /signup @ src/signup.ts:4", "TEST:jest src/signup.test.ts:2 (signs up)"],
            ),
            "Rider signup",
        );
        assert_eq!(outcome.record.status, Status::Tested);
        assert!(!outcome.downgraded());
        assert!(outcome.record.gaps.is_empty());
    }

    #[test]
    fn blank_citations_do_not_count() {
        let outcome = apply(proposal(Status::Implemented, &["  ", ""]), "x");
        assert_eq!(outcome.record.status, Status::Blocked);
        assert!(outcome.record.evidence.is_empty());
    }

    #[test]
    fn non_done_statuses_pass_untouched() {
        for status in [Status::NotStarted, Status::InProgress, Status::Blocked] {
            let outcome = apply(proposal(status, &[]), "x");
            assert_eq!(outcome.record.status, status);
            assert!(outcome.fired.is_none());
        }
    }

    fn citation() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "(route|db|test|ui|ci|file|other):[a-z/.]{1,12}",
            "[a-z ]{0,12}",
        ]
    }

    proptest! {
        #[test]
        fn proptest_gated_records_satisfy_policy(
            status_idx in 0usize..5,
            evidence in proptest::collection::vec(citation(), 0..4),
        ) {
            let status = Status::ALL[status_idx];
            let refs: Vec<&str> = evidence.iter().map(String::as_str).collect();
            let outcome = apply(proposal(status, &refs), "x");

            prop_assert!(outcome.record.satisfies_evidence_policy());
            if outcome.downgraded() {
                prop_assert_eq!(outcome.record.status, Status::Blocked);
                prop_assert!(!outcome.record.gaps.is_empty());
            } else {
                prop_assert_eq!(outcome.record.status, status);
            }
        }
    }
}
