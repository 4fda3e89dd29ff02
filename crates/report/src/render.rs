use crate::aggregate::ReportSummary;
use crate::artifacts::RunMetadata;
use reqgate_protocol::{Status, StatusRow, UndocumentedFeature};

const TITLE_CELL_CHARS: usize = 120;

pub fn render_status_markdown(rows: &[StatusRow], meta: &RunMetadata) -> String {
    let mut md = String::new();
    md.push_str("# Requirements Status (evidence-based)\n\n");
    md.push_str(&format!("- Generated: `{}` (unix ms)\n", meta.generated_at_unix_ms));
    md.push_str(&format!(
        "- Run mode: `{}` | Judge: `{}` | Batch size: `{}`\n",
        meta.run_mode, meta.judge, meta.batch_size
    ));
    md.push_str(&format!(
        "- Source: `{}` (sha256 `{}`)\n",
        meta.source_document.path, meta.source_document.sha256
    ));
    md.push_str(&format!(
        "- Evaluated this run: `{}` of `{}`\n\n",
        meta.requirements_evaluated, meta.requirements_total
    ));

    md.push_str("| Requirement ID | Milestone | Status | Title | Evidence (count) |\n");
    md.push_str("|---|---|---|---|---:|\n");
    for row in rows {
        md.push_str(&format!(
            "| `{}` | {} | **{}** | {} | {} |\n",
            row.requirement_id,
            escape_cell(&row.milestone),
            row.status,
            escape_cell(&truncate_one_line(&row.title, TITLE_CELL_CHARS)),
            row.evidence.len()
        ));
    }
    md.push('\n');

    md.push_str("## Notes (only items with evidence/gaps/notes)\n\n");
    for row in rows {
        if row.evidence.is_empty() && row.gaps.is_empty() && row.notes.trim().is_empty() {
            continue;
        }
        md.push_str(&format!("### {}: {}\n\n", row.requirement_id, row.title));
        push_list(&mut md, "Evidence", &row.evidence);
        push_list(&mut md, "Gaps", &row.gaps);
        if !row.notes.trim().is_empty() {
            md.push_str("**Notes:**\n\n");
            md.push_str(row.notes.trim());
            md.push_str("\n\n");
        }
    }

    finish(md)
}

pub fn render_milestone_summary(summary: &ReportSummary) -> String {
    let mut md = String::new();
    md.push_str("# Milestone Summary (Definition of Done rollups)\n\n");
    md.push_str(&format!("- Completion policy: {}\n", summary.policy));
    md.push_str(&format!(
        "- Overall: `{}` of `{}` complete ({:.1}%)\n\n",
        summary.complete,
        summary.total,
        summary.completion_ratio() * 100.0
    ));

    md.push_str("| Milestone | Total |");
    for status in Status::ALL {
        md.push_str(&format!(" {status} |"));
    }
    md.push_str(" Complete | Determinants of truth (route/db/test/ui/ci/file/other) |\n");
    md.push_str("|---|---:|");
    md.push_str(&"---:|".repeat(Status::ALL.len() + 1));
    md.push_str("---|\n");

    for milestone in &summary.milestones {
        md.push_str(&format!(
            "| {} | {} |",
            escape_cell(&milestone.milestone),
            milestone.total
        ));
        for status in Status::ALL {
            md.push_str(&format!(" {} |", milestone.count(status)));
        }
        md.push_str(&format!(
            " {} | {} |\n",
            milestone.complete,
            milestone.determinants_line()
        ));
    }
    md.push('\n');
    md.push_str(
        "**Milestone Done rule:** done when every requirement in the milestone is `Tested`; \
         a `Tested` status always carries at least one `test:` citation.\n",
    );

    finish(md)
}

pub fn render_undocumented(features: &[UndocumentedFeature]) -> String {
    let mut md = String::from("# Implemented but Not Documented\n\n");
    if features.is_empty() {
        md.push_str("_None identified from the current evidence._\n");
        return md;
    }
    for feature in features {
        let title = feature.title.trim();
        md.push_str(&format!(
            "## {}\n\n",
            if title.is_empty() { "(untitled)" } else { title }
        ));
        push_list(&mut md, "Evidence", &feature.evidence);
        md.push_str("**Why not in requirements:**\n\n");
        md.push_str(feature.why_not_in_requirements.trim());
        md.push_str("\n\n");
    }
    finish(md)
}

fn push_list(md: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("**{heading}:**\n\n"));
    for item in items {
        md.push_str(&format!("- {item}\n"));
    }
    md.push('\n');
}

fn finish(md: String) -> String {
    let mut out = md.trim_end().to_string();
    out.push('\n');
    out
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let s = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_chars {
        return s;
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::artifacts::SourceDocument;
    use crate::taxonomy::CompletionPolicy;
    use reqgate_reconcile::RunMode;
    use std::collections::BTreeMap;

    fn meta() -> RunMetadata {
        RunMetadata {
            generated_at_unix_ms: 42,
            run_mode: RunMode::Test,
            batch_size: 10,
            max_requirements: 200,
            requirements_total: 2,
            requirements_evaluated: 2,
            status_counts: BTreeMap::new(),
            determinants_of_truth_counts: BTreeMap::new(),
            source_document: SourceDocument::from_text("Requirements/doc.md", "x"),
            judge: "replay:fixture".to_string(),
        }
    }

    fn row(status: Status, title: &str, evidence: &[&str]) -> StatusRow {
        StatusRow {
            requirement_id: "BRRS-1".to_string(),
            title: title.to_string(),
            milestone: "Rider App".to_string(),
            status,
            evidence: evidence.iter().map(|e| (*e).to_string()).collect(),
            gaps: Vec::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn status_table_escapes_pipes() {
        let md = render_status_markdown(&[row(Status::NotStarted, "a | b", &[])], &meta());
        assert!(md.contains("| `BRRS-1` | Rider App | **Not Started** | a \\| b | 0 |"));
        assert!(md.contains("Judge: `replay:fixture`"));
        assert!(!md.contains("### BRRS-1"));
    }

    #[test]
    fn status_notes_list_evidence() {
        let md = render_status_markdown(
            &[row(Status::Implemented, "Signup", &["file:src/signup.ts"])],
            &meta(),
        );
        assert!(md.contains("### BRRS-1: Signup\n\n**Evidence:**\n\n- file:src/signup.ts\n"));
        assert!(md.ends_with('\n'));
    }

    #[test]
    fn milestone_table_has_determinant_column() {
        let rows = vec![row(Status::Tested, "Signup", &["test:jest a.test.ts:1 (a)"])];
        let md = render_milestone_summary(&aggregate(&rows, &CompletionPolicy::KeywordFallback));
        assert!(md.contains(
            "| Milestone | Total | Not Started | In Progress | Implemented | Tested | Blocked | Complete |"
        ));
        assert!(md.contains("| Rider App | 1 | 0 | 0 | 0 | 1 | 0 | 1 | 0/0/1/0/0/0/0 |"));
        assert!(md.contains("`1` of `1` complete (100.0%)"));
    }

    #[test]
    fn undocumented_placeholder() {
        assert!(render_undocumented(&[]).contains("_None identified"));
        let md = render_undocumented(&[UndocumentedFeature {
            title: String::new(),
            evidence: vec!["route:GET /debug @ a.ts:1".to_string()],
            why_not_in_requirements: "no section".to_string(),
        }]);
        assert!(md.starts_with("# Implemented but Not Documented\n\n## (untitled)\n"));
    }

    #[test]
    fn truncate_one_line_collapses_whitespace() {
        assert_eq!(truncate_one_line("a\n b\tc", 10), "a b c");
        assert_eq!(truncate_one_line("abcdef", 4), "abc…");
    }
}
