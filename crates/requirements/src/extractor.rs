use crate::acceptance::extract_acceptance;
use crate::config::ParseConfig;
use crate::error::{RequirementsError, Result};
use crate::sectioner::{split_sections, strip_code_fences, Section, SectionerOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use reqgate_protocol::RequirementRecord;
use std::collections::HashSet;

static SECTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)+)\.?\s+(.*)$").expect("valid section prefix regex")
});

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank run regex"));

/// How a record's identifier was derived
#[derive(Debug, Clone, PartialEq, Eq)]
enum IdSource {
    Explicit(String),
    Section(String),
    Positional,
}

/// Turns a requirements document into canonical [`RequirementRecord`]s
#[derive(Debug, Clone)]
pub struct RequirementExtractor {
    config: ParseConfig,
}

impl RequirementExtractor {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Parse `text` (read from `source`) into requirement records, in document order.
    pub fn extract(&self, text: &str, source: &str) -> Result<Vec<RequirementRecord>> {
        self.config
            .validate()
            .map_err(RequirementsError::invalid_config)?;

        let options = SectionerOptions {
            level: self.config.heading_level,
            marker: self.config.heading_marker,
        };
        let sections = split_sections(text, &options)?;
        let explicit_id = self.explicit_id_regex()?;

        let mut used = HashSet::new();
        let mut records = Vec::with_capacity(sections.len());
        for (idx, section) in sections.iter().enumerate() {
            let position = idx + 1;
            let (id_source, title) = self.split_title(&section.title, explicit_id.as_ref());
            let section_number = match &id_source {
                IdSource::Section(number) => Some(number.clone()),
                _ => None,
            };
            let base_id = match id_source {
                IdSource::Explicit(id) => id,
                IdSource::Section(number) => format!("{}-{number}", self.config.namespace),
                IdSource::Positional => format!("{}-{position:04}", self.config.namespace),
            };
            let requirement_id = unique_id(base_id, &mut used, section);

            let description = self.normalize_body(&section.body);
            let acceptance_criteria = extract_acceptance(&description);
            records.push(RequirementRecord {
                requirement_id,
                section_number,
                title,
                missing_acceptance_criteria: acceptance_criteria.is_empty(),
                acceptance_criteria,
                description,
                source_file: source.replace('\\', "/"),
            });
        }

        let missing = records
            .iter()
            .filter(|r| r.missing_acceptance_criteria)
            .count();
        log::info!(
            "Extracted {} requirements from {source} ({missing} without acceptance criteria)",
            records.len()
        );
        Ok(records)
    }

    fn explicit_id_regex(&self) -> Result<Option<Regex>> {
        if !self.config.explicit_ids {
            return Ok(None);
        }
        let pattern = format!(
            r"^({}-\d{{4,}})\s*[:\-]\s*(.+)$",
            regex::escape(&self.config.namespace)
        );
        Regex::new(&pattern)
            .map(Some)
            .map_err(|err| RequirementsError::invalid_config(err.to_string()))
    }

    fn split_title(&self, raw: &str, explicit_id: Option<&Regex>) -> (IdSource, String) {
        let raw = raw.trim();
        if let Some(caps) = explicit_id.and_then(|re| re.captures(raw)) {
            return (
                IdSource::Explicit(caps[1].to_string()),
                caps[2].trim().to_string(),
            );
        }
        if let Some(caps) = SECTION_PREFIX.captures(raw) {
            return (
                IdSource::Section(caps[1].to_string()),
                caps[2].trim().to_string(),
            );
        }
        (IdSource::Positional, raw.to_string())
    }

    fn normalize_body(&self, body: &str) -> String {
        let body = if self.config.strip_code_fences {
            strip_code_fences(body)
        } else {
            body.to_string()
        };
        let trimmed_lines = body
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        BLANK_RUNS
            .replace_all(&trimmed_lines, "\n\n")
            .trim()
            .to_string()
    }
}

fn unique_id(base: String, used: &mut HashSet<String>, section: &Section) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2usize;
    loop {
        let candidate = format!("{base}-{suffix}");
        if used.insert(candidate.clone()) {
            log::warn!(
                "Duplicate requirement id {base} at line {} ('{}'); using {candidate}",
                section.line,
                section.title
            );
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(doc: &str) -> Vec<RequirementRecord> {
        RequirementExtractor::new(ParseConfig::default())
            .extract(doc, "Requirements/canonical.md")
            .expect("extraction failed")
    }

    #[test]
    fn numbered_heading_yields_namespaced_id() {
        let records = extract("### 2.1 Rider signup\nRiders can sign up.\n");
        assert_eq!(records[0].requirement_id, "BRRS-2.1");
        assert_eq!(records[0].section_number.as_deref(), Some("2.1"));
        assert_eq!(records[0].title, "Rider signup");
        assert_eq!(records[0].description, "Riders can sign up.");
    }

    #[test]
    fn unnumbered_heading_gets_positional_fallback() {
        let records = extract("### 1.1 Numbered\nx\n### Free form\ny\n");
        assert_eq!(records[1].requirement_id, "BRRS-0002");
        assert_eq!(records[1].section_number, None);
        assert_eq!(records[1].title, "Free form");
    }

    #[test]
    fn explicit_ids_in_headings_are_honoured() {
        let records = extract("### BRRS-0042: Dispatch map\nbody\n### BRRS-0043 - Heatmap\nbody\n");
        assert_eq!(records[0].requirement_id, "BRRS-0042");
        assert_eq!(records[0].title, "Dispatch map");
        assert_eq!(records[1].requirement_id, "BRRS-0043");
        assert_eq!(records[1].title, "Heatmap");
    }

    #[test]
    fn explicit_ids_can_be_disabled() {
        let config = ParseConfig {
            explicit_ids: false,
            ..Default::default()
        };
        let records = RequirementExtractor::new(config)
            .extract("### BRRS-0042: Dispatch map\n", "doc.md")
            .unwrap();
        assert_eq!(records[0].requirement_id, "BRRS-0001");
        assert_eq!(records[0].title, "BRRS-0042: Dispatch map");
    }

    #[test]
    fn duplicate_ids_get_deterministic_suffix() {
        let records = extract("### 1.1 A\n### 1.1 B\n### 1.1 C\n");
        let ids: Vec<_> = records.iter().map(|r| r.requirement_id.as_str()).collect();
        assert_eq!(ids, vec!["BRRS-1.1", "BRRS-1.1-2", "BRRS-1.1-3"]);
    }

    #[test]
    fn description_is_normalised() {
        let records = extract("### 1.1 A\n\nline one   \n\n\n\nline two\n```\ncode\n```\n");
        assert_eq!(records[0].description, "line one\n\nline two");
    }

    #[test]
    fn missing_acceptance_is_flagged_not_fatal() {
        let records = extract("### 3.1 Reports\nSome prose only.\n");
        assert!(records[0].acceptance_criteria.is_empty());
        assert!(records[0].missing_acceptance_criteria);
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = ParseConfig {
            heading_level: 9,
            ..Default::default()
        };
        let err = RequirementExtractor::new(config)
            .extract("### 1.1 A\n", "doc.md")
            .unwrap_err();
        assert!(matches!(err, RequirementsError::InvalidConfig(_)));
    }

    #[test]
    fn source_path_uses_forward_slashes() {
        let records = RequirementExtractor::new(ParseConfig::default())
            .extract("### 1.1 A\n", r"Requirements\doc.md")
            .unwrap();
        assert_eq!(records[0].source_file, "Requirements/doc.md");
    }
}
