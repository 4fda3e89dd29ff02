use crate::error::{ReportError, Result};
use reqgate_protocol::RequirementRecord;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MILESTONE: &str = "Core/Other";

/// One classification rule: any keyword found in the requirement text selects `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MilestoneRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl MilestoneRule {
    pub fn new(label: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            label: label.into(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    fn matches(&self, blob: &str) -> bool {
        self.keywords.iter().any(|k| blob.contains(k.as_str()))
    }
}

pub fn builtin_rules() -> Vec<MilestoneRule> {
    vec![
        MilestoneRule::new("Rider App", &["rider"]),
        MilestoneRule::new("Driver App", &["driver"]),
        MilestoneRule::new("Dispatch Console", &["dispatch", "dispatcher"]),
        MilestoneRule::new("Tenant Admin", &["tenant"]),
        MilestoneRule::new("Platform Admin", &["super admin", "platform"]),
        MilestoneRule::new("Payments/Payouts", &["payment", "payout"]),
        MilestoneRule::new("Security/Identity", &["security", "auth", "rbac"]),
    ]
}

/// Ordered keyword rules over the lower-cased `title + " " + description`; first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneClassifier {
    rules: Vec<MilestoneRule>,
}

impl Default for MilestoneClassifier {
    fn default() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }
}

impl MilestoneClassifier {
    /// Build from custom rules. Keywords are lower-cased; blank labels or keywords are rejected.
    pub fn with_rules(rules: Vec<MilestoneRule>) -> Result<Self> {
        let mut normalized = Vec::with_capacity(rules.len());
        for rule in rules {
            let label = rule.label.trim().to_string();
            if label.is_empty() {
                return Err(ReportError::invalid_config("milestone rule label is empty"));
            }
            if rule.keywords.is_empty() {
                return Err(ReportError::invalid_config(format!(
                    "milestone rule '{label}' has no keywords"
                )));
            }
            let mut keywords = Vec::with_capacity(rule.keywords.len());
            for keyword in rule.keywords {
                let keyword = keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(ReportError::invalid_config(format!(
                        "milestone rule '{label}' has a blank keyword"
                    )));
                }
                keywords.push(keyword);
            }
            normalized.push(MilestoneRule { label, keywords });
        }
        Ok(Self { rules: normalized })
    }

    pub fn rules(&self) -> &[MilestoneRule] {
        &self.rules
    }

    pub fn classify(&self, title: &str, description: &str) -> &str {
        let blob = format!("{title} {description}").to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&blob))
            .map_or(DEFAULT_MILESTONE, |rule| rule.label.as_str())
    }

    pub fn classify_record(&self, record: &RequirementRecord) -> &str {
        self.classify(&record.title, &record.description)
    }
}
