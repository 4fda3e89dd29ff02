use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Caps that keep a scan (and every prompt built from it) bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanLimits {
    pub max_endpoints: usize,
    pub max_tests: usize,
    pub max_ui_surfaces: usize,
    pub max_ci_workflows: usize,
    pub max_evidence_paths: usize,
    pub max_snippets: usize,
    pub max_migration_files: usize,
    pub max_test_names_per_file: usize,
    /// Lines kept on each side of a snippet anchor
    pub snippet_context_lines: usize,
    pub snippet_max_chars: usize,
    pub max_file_bytes: u64,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_endpoints: 250,
            max_tests: 200,
            max_ui_surfaces: 250,
            max_ci_workflows: 50,
            max_evidence_paths: 250,
            max_snippets: 40,
            max_migration_files: 80,
            max_test_names_per_file: 20,
            snippet_context_lines: 6,
            snippet_max_chars: 1200,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl ScanLimits {
    pub fn validate(&self) -> Result<(), String> {
        let caps = [
            ("max_endpoints", self.max_endpoints),
            ("max_tests", self.max_tests),
            ("max_ui_surfaces", self.max_ui_surfaces),
            ("max_ci_workflows", self.max_ci_workflows),
            ("max_evidence_paths", self.max_evidence_paths),
            ("max_snippets", self.max_snippets),
            ("max_migration_files", self.max_migration_files),
            ("max_test_names_per_file", self.max_test_names_per_file),
            ("snippet_max_chars", self.snippet_max_chars),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, value)| *value == 0) {
            return Err(format!("{name} must be greater than 0"));
        }
        if self.max_file_bytes == 0 {
            return Err("max_file_bytes must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ScanLimits::default().validate().is_ok());
    }

    #[test]
    fn zero_cap_is_rejected_by_name() {
        let limits = ScanLimits {
            max_snippets: 0,
            ..Default::default()
        };
        assert_eq!(
            limits.validate().unwrap_err(),
            "max_snippets must be greater than 0"
        );
    }

    #[test]
    fn zero_context_is_allowed() {
        let limits = ScanLimits {
            snippet_context_lines: 0,
            ..Default::default()
        };
        assert!(limits.validate().is_ok());
    }
}
