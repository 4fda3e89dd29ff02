use anyhow::{anyhow, Context, Result};
use reqgate_evidence::{ScanLimits, ScanScope, DEFAULT_SKIP_DIRS};
use reqgate_reconcile::{
    parse_batch_size, parse_max_requirements, ReconcileConfig, RunMode, DEFAULT_JUDGE_TIMEOUT,
};
use reqgate_report::{builtin_rules, MilestoneClassifier, MilestoneRule};
use reqgate_requirements::ParseConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "reqgate.toml";

pub const ENV_RUN_MODE: &str = "REQGATE_RUN_MODE";
pub const ENV_BATCH_SIZE: &str = "REQGATE_BATCH_SIZE";
pub const ENV_MAX_REQUIREMENTS: &str = "REQGATE_MAX_REQUIREMENTS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReqgateConfig {
    pub requirements: ParseConfig,
    pub scan: ScanSection,
    pub reconcile: ReconcileConfig,
    pub judge: JudgeSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSection {
    pub skip_dirs: Vec<String>,
    pub respect_gitignore: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub file_pattern: Option<String>,
    pub limits: ScanLimits,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| (*s).to_string()).collect(),
            respect_gitignore: true,
            include: Vec::new(),
            exclude: Vec::new(),
            file_pattern: None,
            limits: ScanLimits::default(),
        }
    }
}

impl ScanSection {
    pub fn scope(&self) -> ScanScope {
        ScanScope {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            file_pattern: self.file_pattern.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JudgeSection {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub url: Option<String>,
    /// Name of the environment variable holding the HTTP bearer token
    pub token_env: Option<String>,
    pub timeout_secs: u64,
    pub replay: Option<PathBuf>,
}

impl Default for JudgeSection {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            url: None,
            token_env: None,
            timeout_secs: DEFAULT_JUDGE_TIMEOUT.as_secs(),
            replay: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSection {
    pub taxonomy: Option<PathBuf>,
    /// Replaces the built-in milestone rules when non-empty
    pub milestones: Vec<MilestoneRule>,
}

impl ReportSection {
    pub fn classifier(&self) -> Result<MilestoneClassifier> {
        let rules = if self.milestones.is_empty() {
            builtin_rules()
        } else {
            self.milestones.clone()
        };
        MilestoneClassifier::with_rules(rules).context("Invalid [report.milestones] rules")
    }
}

impl ReqgateConfig {
    /// Load `path`, or `reqgate.toml` in the working directory when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if required {
                return Err(anyhow!("Config file {} not found", path.display()));
            }
            log::debug!("No {} found; using default configuration", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.requirements
            .validate()
            .map_err(|e| anyhow!("[requirements] {e}"))?;
        self.scan.limits.validate().map_err(|e| anyhow!("[scan.limits] {e}"))?;
        self.reconcile
            .validate()
            .map_err(|e| anyhow!("[reconcile] {e}"))?;
        if self.judge.timeout_secs == 0 {
            return Err(anyhow!("[judge] timeout_secs must be greater than 0"));
        }
        Ok(())
    }

    /// Apply `REQGATE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(
            env::var(ENV_RUN_MODE).ok().as_deref(),
            env::var(ENV_BATCH_SIZE).ok().as_deref(),
            env::var(ENV_MAX_REQUIREMENTS).ok().as_deref(),
        )
    }

    fn apply_overrides(
        &mut self,
        run_mode: Option<&str>,
        batch_size: Option<&str>,
        max_requirements: Option<&str>,
    ) -> Result<()> {
        if let Some(raw) = run_mode.map(str::trim).filter(|v| !v.is_empty()) {
            self.reconcile.run_mode = raw
                .parse::<RunMode>()
                .map_err(|e| anyhow!("{ENV_RUN_MODE}: {e}"))?;
        }
        if batch_size.is_some() {
            self.reconcile.batch_size = parse_batch_size(batch_size, self.reconcile.batch_size);
        }
        if max_requirements.is_some() {
            self.reconcile.max_requirements =
                parse_max_requirements(max_requirements, self.reconcile.max_requirements);
        }
        Ok(())
    }
}
