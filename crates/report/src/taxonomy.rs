//! Completion policy for reporting.
//!
//! A taxonomy file names the status labels that count as complete. Three JSON shapes are
//! accepted:
//!
//! ```text
//! A  { "complete_statuses": ["Tested"] }            (also done_/terminal_/pass_statuses)
//! B  { "statuses": [{ "name": "Tested", "is_complete": true },
//!                   { "name": "Shipped", "category": "done" }] }
//! C  { "Tested": true, "Blocked": false }
//! ```
//!
//! Anything that yields no complete label degrades to a keyword check on the status text.
//! The gate never reads this.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

pub const FALLBACK_KEYWORDS: [&str; 5] = ["done", "complete", "implemented", "pass", "tested"];

const LIST_KEYS: [&str; 4] = [
    "complete_statuses",
    "done_statuses",
    "terminal_statuses",
    "pass_statuses",
];
const NAME_KEYS: [&str; 4] = ["name", "id", "status", "label"];
const FLAG_KEYS: [&str; 8] = [
    "is_complete",
    "complete",
    "terminal",
    "done",
    "is_done",
    "is_terminal",
    "is_pass",
    "pass",
];
const CATEGORY_KEYS: [&str; 2] = ["category", "type"];
const COMPLETE_CATEGORIES: [&str; 6] = [
    "complete",
    "completed",
    "done",
    "pass",
    "passed",
    "implemented",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Normalised (trimmed, lower-cased) labels that count as complete
    Taxonomy(BTreeSet<String>),
    #[default]
    KeywordFallback,
}

impl CompletionPolicy {
    /// Load from an optional taxonomy file, degrading to the keyword fallback on any problem.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::debug!("No status taxonomy configured; using keyword fallback");
            return Self::KeywordFallback;
        };
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!(
                    "Status taxonomy {} unreadable ({err}); using keyword fallback",
                    path.display()
                );
                return Self::KeywordFallback;
            }
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!(
                    "Status taxonomy {} is not valid JSON ({err}); using keyword fallback",
                    path.display()
                );
                return Self::KeywordFallback;
            }
        };
        match Self::from_value(&value) {
            Some(policy) => policy,
            None => {
                log::warn!(
                    "Status taxonomy {} names no complete statuses; using keyword fallback",
                    path.display()
                );
                Self::KeywordFallback
            }
        }
    }

    /// `None` when the document yields no complete label.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut complete = BTreeSet::new();
        collect_lists(object, &mut complete);
        collect_status_entries(object, &mut complete);
        collect_flat_flags(object, &mut complete);
        (!complete.is_empty()).then_some(Self::Taxonomy(complete))
    }

    pub fn is_complete(&self, status: &str) -> bool {
        let status = normalize(status);
        if status.is_empty() {
            return false;
        }
        match self {
            Self::Taxonomy(set) => set.contains(&status),
            Self::KeywordFallback => FALLBACK_KEYWORDS.iter().any(|k| status.contains(k)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Taxonomy(set) => format!(
                "taxonomy ({} complete states: {})",
                set.len(),
                set.iter().cloned().collect::<Vec<_>>().join(", ")
            ),
            Self::KeywordFallback => format!(
                "keyword fallback (status contains {})",
                FALLBACK_KEYWORDS.join(" / ")
            ),
        }
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

fn insert_label(label: &str, complete: &mut BTreeSet<String>) {
    let label = normalize(label);
    if !label.is_empty() {
        complete.insert(label);
    }
}

fn collect_lists(object: &Map<String, Value>, complete: &mut BTreeSet<String>) {
    for key in LIST_KEYS {
        let Some(Value::Array(items)) = object.get(key) else {
            continue;
        };
        for item in items.iter().filter_map(Value::as_str) {
            insert_label(item, complete);
        }
    }
}

fn collect_status_entries(object: &Map<String, Value>, complete: &mut BTreeSet<String>) {
    let Some(Value::Array(entries)) = object.get("statuses") else {
        return;
    };
    for entry in entries.iter().filter_map(Value::as_object) {
        let Some(name) = NAME_KEYS
            .iter()
            .find_map(|key| entry.get(*key).and_then(Value::as_str))
        else {
            continue;
        };
        let flagged = FLAG_KEYS
            .iter()
            .any(|key| entry.get(*key) == Some(&Value::Bool(true)));
        let categorized = CATEGORY_KEYS
            .iter()
            .find_map(|key| entry.get(*key).and_then(Value::as_str))
            .is_some_and(|category| COMPLETE_CATEGORIES.contains(&normalize(category).as_str()));
        if flagged || categorized {
            insert_label(name, complete);
        }
    }
}

fn collect_flat_flags(object: &Map<String, Value>, complete: &mut BTreeSet<String>) {
    for (label, value) in object {
        if *value == Value::Bool(true) {
            insert_label(label, complete);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn labels(policy: &CompletionPolicy) -> Vec<String> {
        match policy {
            CompletionPolicy::Taxonomy(set) => set.iter().cloned().collect(),
            CompletionPolicy::KeywordFallback => Vec::new(),
        }
    }

    #[test]
    fn list_shape() {
        let policy =
            CompletionPolicy::from_value(&json!({ "done_statuses": [" Tested ", "", 3] })).unwrap();
        assert_eq!(labels(&policy), vec!["tested"]);
        assert!(policy.is_complete("TESTED"));
        assert!(!policy.is_complete("Implemented"));
    }

    #[test]
    fn status_entry_shape() {
        let policy = CompletionPolicy::from_value(&json!({
            "statuses": [
                { "name": "Tested", "is_complete": true },
                { "label": "Shipped", "category": "Done" },
                { "name": "Blocked", "terminal": false },
                { "complete": true }
            ]
        }))
        .unwrap();
        assert_eq!(labels(&policy), vec!["shipped", "tested"]);
    }

    #[test]
    fn flat_map_shape() {
        let policy =
            CompletionPolicy::from_value(&json!({ "Tested": true, "Blocked": false })).unwrap();
        assert_eq!(labels(&policy), vec!["tested"]);
    }

    #[test]
    fn empty_documents_yield_nothing() {
        assert_eq!(CompletionPolicy::from_value(&json!({ "statuses": [] })), None);
        assert_eq!(CompletionPolicy::from_value(&json!(["Tested"])), None);
    }

    #[test]
    fn fallback_keywords() {
        let policy = CompletionPolicy::KeywordFallback;
        assert!(policy.is_complete("Tested"));
        assert!(policy.is_complete("Implemented"));
        assert!(!policy.is_complete("In Progress"));
        assert!(!policy.is_complete("Blocked"));
        assert!(!policy.is_complete("   "));
    }

    #[test]
    fn load_degrades_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(CompletionPolicy::load(None), CompletionPolicy::KeywordFallback);
        assert_eq!(
            CompletionPolicy::load(Some(&dir.path().join("missing.json"))),
            CompletionPolicy::KeywordFallback
        );

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert_eq!(
            CompletionPolicy::load(Some(&broken)),
            CompletionPolicy::KeywordFallback
        );

        let good = dir.path().join("taxonomy.json");
        std::fs::write(&good, r#"{ "complete_statuses": ["Tested"] }"#).unwrap();
        assert!(matches!(
            CompletionPolicy::load(Some(&good)),
            CompletionPolicy::Taxonomy(_)
        ));
    }
}
