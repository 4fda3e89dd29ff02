use crate::taxonomy::CompletionPolicy;
use reqgate_protocol::{EvidenceKind, Status, StatusRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rollup of one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneAggregate {
    pub milestone: String,
    pub total: usize,
    /// Every status is present, zero when unused
    pub status_counts: BTreeMap<Status, usize>,
    /// Determinants of truth: citations per evidence kind, every kind present
    pub determinants: BTreeMap<EvidenceKind, usize>,
    /// Requirements complete under the active policy
    pub complete: usize,
}

impl MilestoneAggregate {
    fn empty(milestone: impl Into<String>) -> Self {
        Self {
            milestone: milestone.into(),
            total: 0,
            status_counts: zero_status_counts(),
            determinants: zero_determinants(),
            complete: 0,
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    pub fn determinant(&self, kind: EvidenceKind) -> usize {
        self.determinants.get(&kind).copied().unwrap_or(0)
    }

    /// `route/db/test/ui/ci/file/other` counts joined by `/`.
    pub fn determinants_line(&self) -> String {
        EvidenceKind::ALL
            .iter()
            .map(|kind| self.determinant(*kind).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn completion_ratio(&self) -> f64 {
        ratio(self.complete, self.total)
    }

    fn add(&mut self, row: &StatusRow, complete: bool) {
        self.total += 1;
        *self.status_counts.entry(row.status).or_insert(0) += 1;
        for citation in &row.evidence {
            *self
                .determinants
                .entry(EvidenceKind::of_citation(citation))
                .or_insert(0) += 1;
        }
        if complete {
            self.complete += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub status_counts: BTreeMap<Status, usize>,
    pub determinants: BTreeMap<EvidenceKind, usize>,
    pub complete: usize,
    /// Human-readable description of the completion policy in effect
    pub policy: String,
    /// Sorted by milestone name
    pub milestones: Vec<MilestoneAggregate>,
}

impl ReportSummary {
    pub fn completion_ratio(&self) -> f64 {
        ratio(self.complete, self.total)
    }
}

/// Roll status rows up per milestone. Every row lands in exactly one bucket.
pub fn aggregate(rows: &[StatusRow], policy: &CompletionPolicy) -> ReportSummary {
    let mut global = MilestoneAggregate::empty("");
    let mut buckets: BTreeMap<&str, MilestoneAggregate> = BTreeMap::new();

    for row in rows {
        let complete = policy.is_complete(row.status.as_str());
        global.add(row, complete);
        buckets
            .entry(row.milestone.as_str())
            .or_insert_with(|| MilestoneAggregate::empty(row.milestone.as_str()))
            .add(row, complete);
    }

    ReportSummary {
        total: global.total,
        status_counts: global.status_counts,
        determinants: global.determinants,
        complete: global.complete,
        policy: policy.describe(),
        milestones: buckets.into_values().collect(),
    }
}

fn zero_status_counts() -> BTreeMap<Status, usize> {
    Status::ALL.into_iter().map(|s| (s, 0)).collect()
}

fn zero_determinants() -> BTreeMap<EvidenceKind, usize> {
    EvidenceKind::ALL.into_iter().map(|k| (k, 0)).collect()
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}
