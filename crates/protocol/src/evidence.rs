use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of an evidence fact, mirrored by the leading tag of a citation string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// HTTP endpoint (`route:`)
    Route,
    /// Schema column established by a migration (`db:`)
    Db,
    /// Test group or case (`test:`)
    Test,
    /// Page / screen surface (`ui:`)
    Ui,
    /// CI workflow definition (`ci:`)
    Ci,
    /// Plain file reference (`file:`)
    File,
    /// Citation without a recognised tag
    Other,
}

impl EvidenceKind {
    /// Kinds in report column order.
    pub const ALL: [Self; 7] = [
        Self::Route,
        Self::Db,
        Self::Test,
        Self::Ui,
        Self::Ci,
        Self::File,
        Self::Other,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Db => "db",
            Self::Test => "test",
            Self::Ui => "ui",
            Self::Ci => "ci",
            Self::File => "file",
            Self::Other => "other",
        }
    }

    /// Classify a citation string by its leading `<tag>:` (trimmed, case-insensitive).
    pub fn of_citation(citation: &str) -> Self {
        let lowered = citation.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .filter(|kind| *kind != Self::Other)
            .find(|kind| {
                lowered
                    .strip_prefix(kind.tag())
                    .is_some_and(|rest| rest.starts_with(':'))
            })
            .unwrap_or(Self::Other)
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Where an evidence fact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Locator {
    /// Repository-relative path, `/`-separated
    pub path: String,

    /// First line (1-indexed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<usize>,

    /// Last line (1-indexed, inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<usize>,
}

impl Locator {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line_start: None,
            line_end: None,
        }
    }

    pub fn line(path: impl Into<String>, line: usize) -> Self {
        Self {
            path: path.into(),
            line_start: Some(line),
            line_end: Some(line),
        }
    }

    pub fn span(path: impl Into<String>, line_start: usize, line_end: usize) -> Self {
        Self {
            path: path.into(),
            line_start: Some(line_start),
            line_end: Some(line_end),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line_start, self.line_end) {
            (Some(start), Some(end)) if end > start => write!(f, "{}:{start}-{end}", self.path),
            (Some(start), _) => write!(f, "{}:{start}", self.path),
            _ => f.write_str(&self.path),
        }
    }
}

/// A typed, file-anchored fact asserting that some codebase artifact exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceItem {
    pub kind: EvidenceKind,
    pub locator: Locator,
    /// Short description: `GET /api/rides/:id`, `rides.driver_id`, `jest (creates ride)`
    pub payload: String,
}

impl EvidenceItem {
    pub fn new(kind: EvidenceKind, locator: Locator, payload: impl Into<String>) -> Self {
        Self {
            kind,
            locator,
            payload: payload.into(),
        }
    }

    /// Render the typed citation string status records refer to.
    #[must_use]
    pub fn citation(&self) -> String {
        match self.kind {
            EvidenceKind::Route | EvidenceKind::Db => {
                format!("{}:{} @ {}", self.kind, self.payload, self.locator)
            }
            EvidenceKind::Test => format!("test:{}", self.payload_with_locator()),
            EvidenceKind::Ui | EvidenceKind::File => {
                format!("{}:{}", self.kind, self.locator.path)
            }
            EvidenceKind::Ci | EvidenceKind::Other => format!("{}:{}", self.kind, self.payload),
        }
    }

    // Test payloads are `framework (name)`; the locator goes between the two.
    fn payload_with_locator(&self) -> String {
        match self.payload.split_once(' ') {
            Some((framework, name)) => format!("{framework} {} {name}", self.locator),
            None => format!("{} {}", self.payload, self.locator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn citation_tags_round_trip_to_kinds() {
        let items = [
            EvidenceItem::new(
                EvidenceKind::Route,
                Locator::line("src/rides.ts", 12),
                "GET /api/rides/:id",
            ),
            EvidenceItem::new(
                EvidenceKind::Db,
                Locator::line("supabase/migrations/001.sql", 4),
                "rides.driver_id",
            ),
            EvidenceItem::new(
                EvidenceKind::Test,
                Locator::line("src/rides.test.ts", 3),
                "jest (creates ride)",
            ),
            EvidenceItem::new(EvidenceKind::Ui, Locator::file("app/rides/page.tsx"), ""),
            EvidenceItem::new(
                EvidenceKind::Ci,
                Locator::file(".github/workflows/ci.yml"),
                "CI",
            ),
            EvidenceItem::new(EvidenceKind::File, Locator::file("src/rides.ts"), ""),
        ];
        for item in items {
            assert_eq!(EvidenceKind::of_citation(&item.citation()), item.kind);
        }
    }

    #[test]
    fn citation_formats() {
        let route = EvidenceItem::new(
            EvidenceKind::Route,
            Locator::line("src/rides.ts", 12),
            "GET /api/rides/:id",
        );
        assert_eq!(route.citation(), "route:GET /api/rides/:id @ src/rides.ts:12");

        let test = EvidenceItem::new(
            EvidenceKind::Test,
            Locator::line("src/rides.test.ts", 3),
            "jest (creates ride)",
        );
        assert_eq!(test.citation(), "test:jest src/rides.test.ts:3 (creates ride)");

        let ci = EvidenceItem::new(
            EvidenceKind::Ci,
            Locator::file(".github/workflows/ci.yml"),
            "CI",
        );
        assert_eq!(ci.citation(), "ci:CI");
    }

    #[test]
    fn untagged_citations_are_other() {
        assert_eq!(EvidenceKind::of_citation("src/signup.ts"), EvidenceKind::Other);
        assert_eq!(EvidenceKind::of_citation("testing: manual"), EvidenceKind::Other);
        assert_eq!(EvidenceKind::of_citation("  TEST:jest a.test.ts:1"), EvidenceKind::Test);
    }

    #[test]
    fn locator_display() {
        assert_eq!(Locator::file("a.rs").to_string(), "a.rs");
        assert_eq!(Locator::line("a.rs", 3).to_string(), "a.rs:3");
        assert_eq!(Locator::span("a.rs", 3, 9).to_string(), "a.rs:3-9");
    }
}
