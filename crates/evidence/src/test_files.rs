use crate::text::{extension, file_name, line_of_offset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static JS_TEST_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(test|spec)\.(ts|tsx|js|jsx|mjs|cjs|py)$").expect("valid test file regex")
});

static PY_TEST_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(test_.+\.py|.+_test\.py|.+_test\.go)$").expect("valid test file regex")
});

static JS_TEST_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:describe|it|test)\s*\(\s*(?:'([^']+)'|"([^"]+)"|`([^`]+)`)"#)
        .expect("valid js test name regex")
});

static PY_TEST_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:async\s+)?def\s+(test_\w*)").expect("valid python test regex")
});

static GO_TEST_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^func\s+(Test\w*)\s*\(").expect("valid go test regex"));

static VITEST_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]vitest['"]"#).expect("valid vitest regex"));

static PLAYWRIGHT_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]@playwright/test['"]"#).expect("valid playwright regex"));

static CYPRESS_USAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]cypress['"]|\bcy\.visit\("#).expect("valid cypress regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestFramework {
    Jest,
    Vitest,
    Playwright,
    Cypress,
    Pytest,
    Go,
}

impl TestFramework {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jest => "jest",
            Self::Vitest => "vitest",
            Self::Playwright => "playwright",
            Self::Cypress => "cypress",
            Self::Pytest => "pytest",
            Self::Go => "go",
        }
    }

    fn infer(rel_path: &str, text: &str) -> Self {
        match extension(rel_path).as_deref() {
            Some("py") => return Self::Pytest,
            Some("go") => return Self::Go,
            _ => {}
        }
        if PLAYWRIGHT_IMPORT.is_match(text) {
            Self::Playwright
        } else if CYPRESS_USAGE.is_match(text)
            || rel_path.split('/').any(|p| p.eq_ignore_ascii_case("cypress"))
        {
            Self::Cypress
        } else if VITEST_IMPORT.is_match(text) {
            Self::Vitest
        } else {
            Self::Jest
        }
    }
}

impl std::fmt::Display for TestFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFile {
    pub file: String,
    pub framework: TestFramework,
    pub cases: Vec<TestCase>,
}

pub fn is_test_file(rel_path: &str) -> bool {
    JS_TEST_FILE.is_match(rel_path) || PY_TEST_FILE.is_match(file_name(rel_path))
}

/// Describe a test file, keeping at most `max_names` test names. `None` when the path is
/// not a test file.
pub fn scan_test_file(rel_path: &str, text: &str, max_names: usize) -> Option<TestFile> {
    if !is_test_file(rel_path) {
        return None;
    }
    let framework = TestFramework::infer(rel_path, text);
    let pattern: &Regex = match framework {
        TestFramework::Pytest => &*PY_TEST_NAME,
        TestFramework::Go => &*GO_TEST_NAME,
        _ => &*JS_TEST_NAME,
    };

    let cases = pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let name = (1..=3).find_map(|idx| caps.get(idx))?;
            Some(TestCase {
                name: name.as_str().to_string(),
                line: line_of_offset(text, caps.get(0)?.start()),
            })
        })
        .take(max_names)
        .collect();

    Some(TestFile {
        file: rel_path.to_string(),
        framework,
        cases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognises_test_file_conventions() {
        for path in [
            "src/rides.test.ts",
            "web/Checkout.spec.tsx",
            "api/tests/test_rides.py",
            "api/rides_test.py",
            "svc/dispatch_test.go",
        ] {
            assert!(is_test_file(path), "{path}");
        }
        for path in ["src/rides.ts", "docs/testing.md", "svc/dispatch.go"] {
            assert!(!is_test_file(path), "{path}");
        }
    }

    #[test]
    fn jest_names_with_lines() {
        let text = "describe('rides', () => {\n  it(\"creates a ride\", async () => {});\n  test(`cancels`, () => {});\n});\n";
        let file = scan_test_file("src/rides.test.ts", text, 20).unwrap();
        assert_eq!(file.framework, TestFramework::Jest);
        let names: Vec<_> = file.cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["rides", "creates a ride", "cancels"]);
        assert_eq!(file.cases[1].line, 2);
    }

    #[test]
    fn names_are_capped() {
        let text = "it('a')\nit('b')\nit('c')\n";
        let file = scan_test_file("x.spec.js", text, 2).unwrap();
        assert_eq!(file.cases.len(), 2);
    }

    #[test]
    fn framework_inference() {
        let vitest = "import { it } from 'vitest';\nit('x', () => {})";
        assert_eq!(
            scan_test_file("a.test.ts", vitest, 20).unwrap().framework,
            TestFramework::Vitest
        );
        let pw = "import { test } from \"@playwright/test\";";
        assert_eq!(
            scan_test_file("e2e/login.spec.ts", pw, 20).unwrap().framework,
            TestFramework::Playwright
        );
        assert_eq!(
            scan_test_file("cypress/e2e/login.spec.js", "", 20)
                .unwrap()
                .framework,
            TestFramework::Cypress
        );
    }

    #[test]
    fn python_and_go_names() {
        let py = "import pytest\n\ndef test_fare():\n    pass\n\nasync def test_payout():\n    pass\n";
        let file = scan_test_file("tests/test_fare.py", py, 20).unwrap();
        assert_eq!(file.framework, TestFramework::Pytest);
        assert_eq!(file.cases[0].name, "test_fare");
        assert_eq!(file.cases[0].line, 3);
        assert_eq!(file.cases[1].name, "test_payout");

        let go = "package dispatch\n\nfunc TestAssign(t *testing.T) {}\n";
        let file = scan_test_file("dispatch_test.go", go, 20).unwrap();
        assert_eq!(file.framework, TestFramework::Go);
        assert_eq!(file.cases[0].name, "TestAssign");
    }

    #[test]
    fn non_test_files_are_skipped() {
        assert!(scan_test_file("src/rides.ts", "it('x')", 20).is_none());
    }
}
