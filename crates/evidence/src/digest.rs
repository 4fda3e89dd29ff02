use crate::scanner::ScanReport;

const SAMPLE_TABLES: usize = 25;
const SAMPLE_ENDPOINTS: usize = 40;
const SAMPLE_TESTS: usize = 25;
const SAMPLE_UI: usize = 25;
const SAMPLE_CI: usize = 25;

/// Markdown "as-is" digest of a scan, the evidence summary a judge reads.
pub fn render_digest(report: &ScanReport, document: &str) -> String {
    let mut md = String::new();
    md.push_str("# As-Is Scan (deterministic, evidence-oriented)\n\n");
    md.push_str(&format!("- Canonical requirements: `{document}`\n"));
    md.push_str(&format!("- Files scanned: `{}`\n", report.files_scanned));
    if !report.truncated.is_empty() {
        let flags: Vec<&str> = report.truncated.iter().map(|t| t.as_str()).collect();
        md.push_str(&format!(
            "- Truncated (not found does not mean absent): `{}`\n",
            flags.join(", ")
        ));
    }
    md.push('\n');

    md.push_str("## Database schema (migrations)\n\n");
    md.push_str(&format!(
        "- Migration files scanned: `{}`\n",
        report.schema.migration_files.len()
    ));
    md.push_str(&format!("- Tables found: `{}`\n", report.schema.tables.len()));
    for (name, table) in report.schema.tables.iter().take(SAMPLE_TABLES) {
        md.push_str(&format!("  - `{name}` (columns: {})\n", table.columns.len()));
    }
    md.push('\n');

    md.push_str(&format!(
        "## API endpoints ({} found, sample)\n\n",
        report.endpoints.len()
    ));
    for endpoint in report.endpoints.iter().take(SAMPLE_ENDPOINTS) {
        let location = match endpoint.line {
            Some(line) => format!("{}:{line}", endpoint.file),
            None => endpoint.file.clone(),
        };
        md.push_str(&format!("- `{}` in `{location}`\n", endpoint.signature()));
    }
    md.push('\n');

    md.push_str(&format!("## Tests ({} files, sample)\n\n", report.tests.len()));
    for test in report.tests.iter().take(SAMPLE_TESTS) {
        md.push_str(&format!(
            "- `{}` ({}, {} names)\n",
            test.file,
            test.framework,
            test.cases.len()
        ));
    }
    md.push('\n');

    md.push_str(&format!(
        "## UI pages/screens ({} found, sample)\n\n",
        report.ui_surfaces.len()
    ));
    for path in report.ui_surfaces.iter().take(SAMPLE_UI) {
        md.push_str(&format!("- `{path}`\n"));
    }
    md.push('\n');

    md.push_str("## CI workflows\n\n");
    for ci in report.ci_workflows.iter().take(SAMPLE_CI) {
        md.push_str(&format!("- `{}` in `{}`\n", ci.name, ci.file));
    }
    md.push('\n');

    md.push_str("## Snippets included in prompt (count)\n\n");
    md.push_str(&format!("- Snippets: `{}`\n", report.snippets.len()));
    md
}

/// Literal snippet block sent alongside the digest.
pub fn render_snippets(report: &ScanReport) -> String {
    let mut out = String::new();
    for snippet in &report.snippets {
        out.push_str(&format!(
            "### {}: {}:{}-{}\n```\n{}\n```\n\n",
            snippet.kind, snippet.file, snippet.line_start, snippet.line_end, snippet.text
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::EvidenceScanner;
    use crate::tree::MemoryTree;
    use reqgate_protocol::Truncation;

    fn report() -> ScanReport {
        let tree = MemoryTree::new()
            .with_file(
                "src/rides.js",
                "const router = express.Router();\nrouter.get('/rides/:id', show);\n",
            )
            .with_file("db/migrations/001.sql", "create table rides (id uuid);\n");
        EvidenceScanner::default().scan(&tree)
    }

    #[test]
    fn digest_lists_findings() {
        let md = render_digest(&report(), "Requirements/Canonical_Requirements.md");
        assert!(md.starts_with("# As-Is Scan"));
        assert!(md.contains("- Canonical requirements: `Requirements/Canonical_Requirements.md`"));
        assert!(md.contains("- `GET /rides/:id` in `src/rides.js:2`"));
        assert!(md.contains("  - `rides` (columns: 1)"));
        assert!(!md.contains("Truncated"));
    }

    #[test]
    fn digest_discloses_truncation() {
        let mut report = report();
        report.truncated.push(Truncation::MaxSnippets);
        let md = render_digest(&report, "doc.md");
        assert!(md.contains("`max_snippets`"));
    }

    #[test]
    fn snippets_are_fenced_with_location() {
        let block = render_snippets(&report());
        assert!(block.starts_with("### route: src/rides.js:1-2\n```\n"));
        assert!(block.contains("router.get('/rides/:id', show);"));
    }
}
