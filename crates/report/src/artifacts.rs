//! Run artifacts. Every write replaces the previous file through a temporary sibling, so a
//! crashed run never leaves a half-written artifact behind a complete one.

use crate::aggregate::ReportSummary;
use crate::error::{ReportError, Result};
use crate::render::{render_milestone_summary, render_status_markdown, render_undocumented};
use reqgate_evidence::{render_digest, render_snippets, ScanReport};
use reqgate_protocol::{
    EvidenceKind, RequirementRecord, Status, StatusRecord, StatusRow, UndocumentedFeature,
};
use reqgate_reconcile::{ReconcileConfig, RunMode, RunSummary};
use reqgate_requirements::QualityReport;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const REQUIREMENTS_JSONL: &str = "requirements.jsonl";
pub const REQUIREMENTS_JSON: &str = "requirements.json";
pub const QUALITY_REPORT_MD: &str = "requirements_quality_report.md";
pub const STATUS_SEED_JSONL: &str = "requirements_status_seed.jsonl";
pub const SCAN_JSON: &str = "as_is_scan.json";
pub const SCAN_MD: &str = "as_is_scan.md";
pub const STATUS_JSONL: &str = "requirements_status.jsonl";
pub const STATUS_MD: &str = "requirements_status.md";
pub const MILESTONE_SUMMARY_MD: &str = "milestone_summary.md";
pub const UNDOCUMENTED_MD: &str = "implemented_not_documented.md";
pub const RUN_METADATA_JSON: &str = "run_metadata.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub path: String,
    pub sha256: String,
}

impl SourceDocument {
    pub fn from_text(path: impl Into<String>, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let sha256 = hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        Self {
            path: path.into(),
            sha256,
        }
    }
}

/// Provenance of one reconciliation run, written last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub generated_at_unix_ms: u64,
    pub run_mode: RunMode,
    pub batch_size: usize,
    pub max_requirements: usize,
    pub requirements_total: usize,
    pub requirements_evaluated: usize,
    pub status_counts: BTreeMap<Status, usize>,
    pub determinants_of_truth_counts: BTreeMap<EvidenceKind, usize>,
    pub source_document: SourceDocument,
    pub judge: String,
}

impl RunMetadata {
    pub fn from_run(
        config: &ReconcileConfig,
        run: &RunSummary,
        report: &ReportSummary,
        source_document: SourceDocument,
        judge: impl Into<String>,
    ) -> Self {
        Self {
            generated_at_unix_ms: unix_now_ms(),
            run_mode: config.run_mode,
            batch_size: config.batch_size,
            max_requirements: config.max_requirements,
            requirements_total: report.total,
            requirements_evaluated: run.evaluated,
            status_counts: report.status_counts.clone(),
            determinants_of_truth_counts: report.determinants.clone(),
            source_document,
            judge: judge.into(),
        }
    }
}

/// Writes the named artifacts of one directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Create the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn write_requirements(&self, requirements: &[RequirementRecord]) -> Result<Vec<PathBuf>> {
        let jsonl = self.path(REQUIREMENTS_JSONL);
        write_jsonl(&jsonl, requirements)?;
        let json = self.path(REQUIREMENTS_JSON);
        write_json(&json, requirements)?;
        Ok(vec![jsonl, json])
    }

    pub fn write_quality_report(&self, report: &QualityReport) -> Result<PathBuf> {
        let path = self.path(QUALITY_REPORT_MD);
        write_text(&path, &report.render_markdown())?;
        Ok(path)
    }

    pub fn write_status_seed(&self, seed: &[StatusRecord]) -> Result<PathBuf> {
        let path = self.path(STATUS_SEED_JSONL);
        write_jsonl(&path, seed)?;
        Ok(path)
    }

    /// `as_is_scan.json` plus the markdown digest (with snippets) for `document`.
    pub fn write_scan(&self, report: &ScanReport, document: &str) -> Result<Vec<PathBuf>> {
        let json = self.path(SCAN_JSON);
        write_json(&json, report)?;

        let mut md = render_digest(report, document);
        let snippets = render_snippets(report);
        if !snippets.is_empty() {
            md.push_str("\n## Snippets\n\n");
            md.push_str(&snippets);
        }
        let md_path = self.path(SCAN_MD);
        write_text(&md_path, &md)?;
        Ok(vec![json, md_path])
    }

    pub fn write_status(&self, rows: &[StatusRow], meta: &RunMetadata) -> Result<Vec<PathBuf>> {
        let jsonl = self.path(STATUS_JSONL);
        write_jsonl(&jsonl, rows)?;
        let md = self.path(STATUS_MD);
        write_text(&md, &render_status_markdown(rows, meta))?;
        Ok(vec![jsonl, md])
    }

    pub fn write_milestone_summary(&self, summary: &ReportSummary) -> Result<PathBuf> {
        let path = self.path(MILESTONE_SUMMARY_MD);
        write_text(&path, &render_milestone_summary(summary))?;
        Ok(path)
    }

    pub fn write_undocumented(&self, features: &[UndocumentedFeature]) -> Result<PathBuf> {
        let path = self.path(UNDOCUMENTED_MD);
        write_text(&path, &render_undocumented(features))?;
        Ok(path)
    }

    pub fn write_run_metadata(&self, meta: &RunMetadata) -> Result<PathBuf> {
        let path = self.path(RUN_METADATA_JSON);
        write_json(&path, meta)?;
        Ok(path)
    }
}

/// One JSON value per line, trailing newline included.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    write_text(path, &out)
}

/// Read a status JSONL file; blank lines are skipped.
pub fn read_status_rows(path: &Path) -> Result<Vec<StatusRow>> {
    let raw = std::fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = serde_json::from_str(line).map_err(|err| ReportError::MalformedRow {
            path: path.to_path_buf(),
            line: idx + 1,
            message: err.to_string(),
        })?;
        rows.push(row);
    }
    log::debug!("Read {} status rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_text(path, &json)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
