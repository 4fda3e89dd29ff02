use reqgate_protocol::RequirementRecord;
use serde::Serialize;

/// Requirement that could not be given acceptance criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCriteria {
    pub requirement_id: String,
    pub title: String,
}

/// Acceptance-criteria coverage of a parsed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub total: usize,
    pub missing: Vec<MissingCriteria>,
}

impl QualityReport {
    pub fn from_requirements(requirements: &[RequirementRecord]) -> Self {
        let missing = requirements
            .iter()
            .filter(|r| r.missing_acceptance_criteria || r.acceptance_criteria.is_empty())
            .map(|r| MissingCriteria {
                requirement_id: r.requirement_id.clone(),
                title: r.title.clone(),
            })
            .collect();
        Self {
            total: requirements.len(),
            missing,
        }
    }

    pub fn render_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Requirements Quality Report\n\n");
        md.push_str(&format!("- Total requirements: {}\n", self.total));
        md.push_str(&format!(
            "- Missing acceptance criteria (Given/When/Then): {}\n\n",
            self.missing.len()
        ));
        if self.missing.is_empty() {
            md.push_str("All requirements include acceptance criteria.\n");
            return md;
        }
        md.push_str("## Missing acceptance criteria\n\n");
        for item in &self.missing {
            md.push_str(&format!("- {}: {}\n", item.requirement_id, item.title));
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, criteria: &[&str]) -> RequirementRecord {
        RequirementRecord {
            requirement_id: id.to_string(),
            section_number: None,
            title: format!("Title {id}"),
            description: String::new(),
            acceptance_criteria: criteria.iter().map(|c| (*c).to_string()).collect(),
            missing_acceptance_criteria: criteria.is_empty(),
            source_file: "doc.md".to_string(),
        }
    }

    #[test]
    fn lists_requirements_without_criteria() {
        let report =
            QualityReport::from_requirements(&[record("A", &["Given x"]), record("B", &[])]);
        assert_eq!(report.total, 2);
        assert_eq!(report.missing.len(), 1);
        assert!(report.render_markdown().contains("- B: Title B"));
    }

    #[test]
    fn complete_document_says_so() {
        let report = QualityReport::from_requirements(&[record("A", &["Given x"])]);
        assert!(report
            .render_markdown()
            .contains("All requirements include acceptance criteria."));
    }
}
