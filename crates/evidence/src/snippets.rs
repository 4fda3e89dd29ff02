use reqgate_protocol::{truncate_chars, EvidenceKind};
use serde::{Deserialize, Serialize};

/// Literal source excerpt around an evidence anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub kind: EvidenceKind,
    pub file: String,
    pub line_start: usize,
    pub line_end: usize,
    pub text: String,
}

/// Cut a window of `context` lines on each side of the 1-based `anchor_line`.
pub fn window(
    kind: EvidenceKind,
    file: &str,
    text: &str,
    anchor_line: usize,
    context: usize,
    max_chars: usize,
) -> Option<Snippet> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() || anchor_line == 0 || anchor_line > lines.len() {
        return None;
    }
    let line_start = anchor_line.saturating_sub(context).max(1);
    let line_end = (anchor_line + context).min(lines.len());
    let body = lines[line_start - 1..line_end].join("\n");
    Some(Snippet {
        kind,
        file: file.to_string(),
        line_start,
        line_end,
        text: truncate_chars(&body, max_chars).to_string(),
    })
}
