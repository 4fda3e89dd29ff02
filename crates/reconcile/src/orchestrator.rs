use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, Result};
use crate::gate;
use crate::judge::Judge;
use crate::ledger::StatusLedger;
use crate::prompt::{build_request, EvidenceContext};
use reqgate_protocol::{RequirementRecord, StatusRecord, UndocumentedFeature};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub batches: usize,
    /// Requirements submitted to the judge
    pub evaluated: usize,
    /// Records written to the ledger
    pub committed: usize,
    /// Committed records the gate downgraded to `Blocked`
    pub downgraded: usize,
    /// Ids the judge returned that are not canonical requirements
    pub ignored_ids: Vec<String>,
    /// Features reported by the first batch only
    pub undocumented: Vec<UndocumentedFeature>,
}

/// Drives batches of requirements through a [`Judge`] and the evidence gate.
pub struct Reconciler {
    judge: Box<dyn Judge>,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(judge: Box<dyn Judge>, config: ReconcileConfig) -> Self {
        Self { judge, config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn judge_description(&self) -> String {
        self.judge.describe()
    }

    /// Reconcile the run's target requirements, committing into `ledger` batch by batch.
    ///
    /// A judge failure aborts the run with the failing batch index; batches committed
    /// before it stay in the ledger.
    pub async fn run(
        &self,
        ledger: &mut StatusLedger,
        requirements: &[RequirementRecord],
        context: &EvidenceContext,
    ) -> Result<RunSummary> {
        self.config
            .validate()
            .map_err(ReconcileError::invalid_config)?;

        let canonical: HashMap<&str, &RequirementRecord> = requirements
            .iter()
            .map(|r| (r.requirement_id.as_str(), r))
            .collect();
        let target = &requirements[..self.config.target_count(requirements.len())];
        let total_batches = target.len().div_ceil(self.config.batch_size);
        log::info!(
            "Reconciling {} of {} requirements in {total_batches} batches ({} mode, judge {})",
            target.len(),
            requirements.len(),
            self.config.run_mode,
            self.judge.describe()
        );

        let mut summary = RunSummary::default();
        for (batch_idx, batch) in target.chunks(self.config.batch_size).enumerate() {
            let include_undocumented = batch_idx == 0;
            let request = build_request(batch, context, &self.config, include_undocumented);
            log::info!(
                "Judging batch {}/{total_batches} ({} requirements)",
                batch_idx + 1,
                batch.len()
            );

            let response = self
                .judge
                .judge(&request)
                .await
                .map_err(|source| ReconcileError::Judge {
                    batch: batch_idx,
                    source,
                })?;
            if response.updated_statuses.is_empty() {
                log::warn!("Judge returned no statuses for batch {}", batch_idx + 1);
            }

            let mut staged: Vec<StatusRecord> = Vec::new();
            let mut downgraded: HashMap<String, bool> = HashMap::new();
            for proposal in response.updated_statuses {
                let Some(requirement) = canonical.get(proposal.requirement_id.as_str()) else {
                    log::debug!(
                        "Dropping verdict for unknown requirement {}",
                        proposal.requirement_id
                    );
                    summary.ignored_ids.push(proposal.requirement_id);
                    continue;
                };
                let outcome = gate::apply(proposal, &requirement.title);
                downgraded.insert(outcome.record.requirement_id.clone(), outcome.downgraded());
                // A repeated id within one response: the last verdict wins.
                match staged
                    .iter_mut()
                    .find(|r| r.requirement_id == outcome.record.requirement_id)
                {
                    Some(existing) => *existing = outcome.record,
                    None => staged.push(outcome.record),
                }
            }

            if include_undocumented {
                summary.undocumented = response.implemented_not_documented;
            } else if !response.implemented_not_documented.is_empty() {
                log::warn!(
                    "Ignoring {} undocumented features from batch {} (only the first batch reports them)",
                    response.implemented_not_documented.len(),
                    batch_idx + 1
                );
            }

            summary.downgraded += downgraded.values().filter(|d| **d).count();
            summary.committed += ledger.commit(staged);
            summary.batches += 1;
            summary.evaluated += batch.len();
        }

        log::info!(
            "Reconciliation finished: {} committed, {} downgraded by the gate, {} unknown ids",
            summary.committed,
            summary.downgraded,
            summary.ignored_ids.len()
        );
        Ok(summary)
    }
}
