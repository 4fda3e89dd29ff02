//! # reqgate reconcile
//!
//! Batch reconciliation of requirements against scan evidence.
//!
//! ```text
//! requirements ──> batches (document order, strictly sequential)
//!                     │
//!                     ▼
//!              JudgeRequest ──> dyn Judge (command │ http │ replay)
//!                                   │ untrusted proposals
//!                                   ▼
//!                              gate::apply ──> staged batch ──> StatusLedger
//! ```
//!
//! A batch is committed whole or not at all. The judge decides nothing on its own:
//! `Implemented` and `Tested` survive only with the evidence the gate demands.

mod config;
mod error;
pub mod gate;
mod judge;
mod ledger;
mod orchestrator;
mod prompt;

pub use config::{
    parse_batch_size, parse_max_requirements, ReconcileConfig, RunMode, TEST_MODE_REQUIREMENTS,
};
pub use error::{JudgeError, ReconcileError, Result};
pub use gate::{GateOutcome, GateRule};
pub use judge::{
    parse_response, CommandJudge, HttpJudge, Judge, ReplayJudge, DEFAULT_JUDGE_TIMEOUT,
};
pub use ledger::StatusLedger;
pub use orchestrator::{Reconciler, RunSummary};
pub use prompt::{instructions, EvidenceContext};
