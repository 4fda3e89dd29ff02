use crate::requirement::RequirementRecord;
use crate::status::Status;
use crate::truncate_chars;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Slimmed requirement as sent to the judge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct BatchRequirement {
    pub requirement_id: String,
    pub title: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    pub description: String,
}

impl BatchRequirement {
    pub fn from_record(record: &RequirementRecord, description_max_chars: usize) -> Self {
        Self {
            requirement_id: record.requirement_id.clone(),
            title: record.title.clone(),
            acceptance_criteria: record.acceptance_criteria.clone(),
            description: truncate_chars(&record.description, description_max_chars).to_string(),
        }
    }
}

/// One batch submitted to the external judge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct JudgeRequest {
    /// Evidence rules the judge is asked to follow (advisory; the gate enforces them)
    pub instructions: String,
    pub requirements: Vec<BatchRequirement>,
    /// Bounded markdown digest of the scan
    pub evidence_digest: String,
    /// Bounded literal code snippets
    pub snippets: String,
    /// Only the first batch of a run asks for undocumented features
    pub include_undocumented: bool,
}

/// A status the judge proposes for one requirement. Untrusted until gate-checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ProposedStatus {
    pub requirement_id: String,
    pub status: Status,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// A feature the judge found implemented but absent from the requirements document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct UndocumentedFeature {
    pub title: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub why_not_in_requirements: String,
}

/// Structured judgement for one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct JudgeResponse {
    pub updated_statuses: Vec<ProposedStatus>,
    #[serde(default)]
    pub implemented_not_documented: Vec<UndocumentedFeature>,
}

/// JSON Schema of [`JudgeResponse`], for transports that request structured output.
pub fn judge_response_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(JudgeResponse)).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn response_defaults_optional_lists() {
        let raw = r#"{"updated_statuses":[{"requirement_id":"BRRS-1.1","status":"Implemented"}]}"#;
        let parsed: JudgeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.updated_statuses.len(), 1);
        assert!(parsed.updated_statuses[0].evidence.is_empty());
        assert!(parsed.implemented_not_documented.is_empty());
    }

    #[test]
    fn response_without_statuses_is_rejected() {
        let err = serde_json::from_str::<JudgeResponse>(r#"{"implemented_not_documented":[]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn batch_requirement_truncates_description() {
        let record = RequirementRecord {
            requirement_id: "BRRS-0001".to_string(),
            section_number: None,
            title: "Long".to_string(),
            description: "x".repeat(50),
            acceptance_criteria: vec![],
            missing_acceptance_criteria: true,
            source_file: "req.md".to_string(),
        };
        let slim = BatchRequirement::from_record(&record, 10);
        assert_eq!(slim.description.len(), 10);
    }

    #[test]
    fn schema_names_status_field() {
        let schema = judge_response_schema().to_string();
        assert!(schema.contains("updated_statuses"));
        assert!(schema.contains("Not Started"));
    }
}
