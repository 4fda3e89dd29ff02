use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requirements evaluated by a `Test` run, to keep smoke runs cheap.
pub const TEST_MODE_REQUIREMENTS: usize = 5;

const MAX_BATCH_SIZE: usize = 100;
const MAX_REQUIREMENTS_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Test,
    Full,
}

impl RunMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown run mode '{other}' (expected test or full)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    pub batch_size: usize,
    pub max_requirements: usize,
    pub run_mode: RunMode,
    pub description_max_chars: usize,
    pub digest_max_chars: usize,
    pub snippets_max_chars: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_requirements: 200,
            run_mode: RunMode::Test,
            description_max_chars: 2000,
            digest_max_chars: 12_000,
            snippets_max_chars: 12_000,
        }
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.max_requirements == 0 {
            return Err("max_requirements must be greater than 0".to_string());
        }
        if self.digest_max_chars == 0 || self.snippets_max_chars == 0 {
            return Err("digest and snippet budgets must be greater than 0".to_string());
        }
        Ok(())
    }

    /// How many requirements a run evaluates out of `available`.
    pub fn target_count(&self, available: usize) -> usize {
        let cap = match self.run_mode {
            RunMode::Test => self.max_requirements.min(TEST_MODE_REQUIREMENTS),
            RunMode::Full => self.max_requirements,
        };
        available.min(cap)
    }
}

/// Parse a batch size knob (env var or flag); blank or garbage falls back to the default.
pub fn parse_batch_size(raw: Option<&str>, default_value: usize) -> usize {
    parse_clamped(raw, default_value, MAX_BATCH_SIZE)
}

pub fn parse_max_requirements(raw: Option<&str>, default_value: usize) -> usize {
    parse_clamped(raw, default_value, MAX_REQUIREMENTS_LIMIT)
}

fn parse_clamped(raw: Option<&str>, default_value: usize, max: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, max)
}
