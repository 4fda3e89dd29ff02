use crate::error::{RequirementsError, Result};

/// Lines of the document echoed back when no headings are found.
const PREVIEW_LINES: usize = 20;

const MAX_HEADING_DEPTH: usize = 6;

/// Which headings delimit sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionerOptions {
    /// Heading depth that starts a section
    pub level: usize,
    /// Marker character (`#` for ATX markdown)
    pub marker: char,
}

impl Default for SectionerOptions {
    fn default() -> Self {
        Self {
            level: 3,
            marker: '#',
        }
    }
}

/// A heading-delimited block of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading depth
    pub level: usize,
    /// Heading text, closing markers removed
    pub title: String,
    /// Raw text between the heading line and the next heading of the same or shallower depth
    pub body: String,
    /// Heading line (1-indexed)
    pub line: usize,
}

#[derive(Debug)]
struct Heading {
    level: usize,
    title: String,
    line: usize,
    line_start: usize,
    body_start: usize,
}

/// Split `text` into sections at `options.level`.
///
/// Deeper headings stay inside the body of their enclosing section. Headings inside fenced
/// code blocks are ignored.
pub fn split_sections(text: &str, options: &SectionerOptions) -> Result<Vec<Section>> {
    let normalized = text.replace("\r\n", "\n");
    let headings = scan_headings(&normalized, options.marker);

    let mut sections = Vec::new();
    for (idx, heading) in headings.iter().enumerate() {
        if heading.level != options.level {
            continue;
        }
        let end = headings[idx + 1..]
            .iter()
            .find(|next| next.level <= options.level)
            .map_or(normalized.len(), |next| next.line_start);
        sections.push(Section {
            level: heading.level,
            title: heading.title.clone(),
            body: normalized[heading.body_start..end].to_string(),
            line: heading.line,
        });
    }

    if sections.is_empty() {
        return Err(RequirementsError::NoHeadings {
            level: options.level,
            marker: options.marker.to_string().repeat(options.level),
            preview: preview(&normalized),
        });
    }

    log::debug!(
        "Split {} sections at level {} ({} headings total)",
        sections.len(),
        options.level,
        headings.len()
    );
    Ok(sections)
}

fn scan_headings(text: &str, marker: char) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut fence: Option<Fence> = None;
    let mut offset = 0usize;

    for (idx, raw_line) in text.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw_line.len();
        let line = raw_line.trim_end_matches('\n');

        if let Some(open) = fence {
            if open.closes(line) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = Fence::opens(line) {
            fence = Some(open);
            continue;
        }

        if let Some((level, title)) = parse_heading(line, marker) {
            headings.push(Heading {
                level,
                title,
                line: idx + 1,
                line_start,
                body_start: offset,
            });
        }
    }

    headings
}

/// Parse an ATX heading: up to three spaces of indent, 1..=6 markers, whitespace, title.
fn parse_heading(line: &str, marker: char) -> Option<(usize, String)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.chars().take_while(|c| *c == marker).count();
    if level == 0 || level > MAX_HEADING_DEPTH {
        return None;
    }
    let after = &rest[level * marker.len_utf8()..];
    if !after.starts_with([' ', '\t']) {
        return None;
    }

    let mut title = after.trim();
    let without_closing = title.trim_end_matches(marker);
    if without_closing.len() < title.len()
        && (without_closing.is_empty() || without_closing.ends_with([' ', '\t']))
    {
        title = without_closing.trim_end();
    }
    if title.is_empty() {
        return None;
    }
    Some((level, title.to_string()))
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    ch: char,
    len: usize,
}

impl Fence {
    fn opens(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == ch).count();
        (len >= 3).then_some(Self { ch, len })
    }

    fn closes(self, line: &str) -> bool {
        let trimmed = line.trim();
        let run = trimmed.chars().take_while(|c| *c == self.ch).count();
        run >= self.len && trimmed.chars().skip(run).all(char::is_whitespace)
    }
}

/// Remove fenced code blocks (fence lines included).
pub(crate) fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut fence: Option<Fence> = None;
    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches('\n');
        if let Some(open) = fence {
            if open.closes(bare) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = Fence::opens(bare) {
            fence = Some(open);
            continue;
        }
        out.push_str(line);
    }
    out
}

fn preview(text: &str) -> String {
    text.lines()
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}
