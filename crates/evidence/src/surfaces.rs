use crate::text::file_name;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PAGE_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|/)(app|pages)/.+page\.(tsx|jsx)$").expect("valid page regex")
});

static SCREEN_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|/)(screens|views)/.+\.(tsx|jsx)$").expect("valid screen regex")
});

static GITHUB_WORKFLOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|/)\.github/workflows/[^/]+\.ya?ml$").expect("valid workflow regex")
});

static WORKFLOW_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^name:[ \t]*(.+?)[ \t]*$").expect("valid workflow name regex"));

pub fn is_ui_surface(rel_path: &str) -> bool {
    PAGE_FILE.is_match(rel_path) || SCREEN_FILE.is_match(rel_path)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiWorkflow {
    pub name: String,
    pub file: String,
}

pub fn is_ci_config(rel_path: &str) -> bool {
    GITHUB_WORKFLOW.is_match(rel_path)
        || file_name(rel_path) == ".gitlab-ci.yml"
        || rel_path == ".circleci/config.yml"
        || rel_path.ends_with("/.circleci/config.yml")
}

/// Workflow named by its top-level `name:`, else by the file stem.
pub fn scan_ci_config(rel_path: &str, text: &str) -> Option<CiWorkflow> {
    if !is_ci_config(rel_path) {
        return None;
    }
    let name = WORKFLOW_NAME
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| file_stem(rel_path));
    Some(CiWorkflow {
        name,
        file: rel_path.to_string(),
    })
}

fn file_stem(rel_path: &str) -> String {
    let name = file_name(rel_path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pages_and_screens_are_ui() {
        assert!(is_ui_surface("apps/web/app/rides/page.tsx"));
        assert!(is_ui_surface("src/pages/DriverPage.JSX"));
        assert!(is_ui_surface("mobile/src/screens/RideRequest.tsx"));
        assert!(is_ui_surface("views/Dashboard.jsx"));
        assert!(!is_ui_surface("apps/web/app/rides/layout.tsx"));
        assert!(!is_ui_surface("src/components/Button.tsx"));
    }

    #[test]
    fn workflow_name_from_yaml() {
        let text = "# comment\nname: \"Deploy API\"\non: push\njobs:\n  build:\n    name: inner\n";
        let ci = scan_ci_config(".github/workflows/deploy.yml", text).unwrap();
        assert_eq!(ci.name, "Deploy API");
    }

    #[test]
    fn workflow_name_falls_back_to_stem() {
        let ci = scan_ci_config(".github/workflows/test.yaml", "on: push\n").unwrap();
        assert_eq!(ci.name, "test");
        let gitlab = scan_ci_config(".gitlab-ci.yml", "stages: [test]\n").unwrap();
        assert_eq!(gitlab.name, ".gitlab-ci");
    }

    #[test]
    fn only_known_ci_locations() {
        assert!(is_ci_config(".circleci/config.yml"));
        assert!(is_ci_config("services/api/.gitlab-ci.yml"));
        assert!(!is_ci_config(".github/dependabot.yml"));
        assert!(!is_ci_config(".github/workflows/nested/x.yml"));
        assert!(scan_ci_config("config.yml", "name: x").is_none());
    }
}
