use once_cell::sync::Lazy;
use regex::Regex;

static ACCEPTANCE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bAcceptance\b\s*:").expect("valid acceptance label regex"));

static GIVEN_WHEN_THEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(Given|When|Then)\b").expect("valid given/when/then regex"));

static BOLD_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*.+\*\*\s*:?\s*$").expect("valid bold label regex"));

/// Extract acceptance criteria from a section body.
///
/// First tier: the contiguous run of bullets / Given-When-Then lines after the first
/// `Acceptance:` label, ending at a blank line (once something was collected) or a bold
/// sub-section label. Second tier, used only when the first yields nothing: every
/// Given/When/Then line anywhere in the body.
pub fn extract_acceptance(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body.lines().map(str::trim).collect();

    if let Some(label_idx) = lines.iter().position(|line| ACCEPTANCE_LABEL.is_match(line)) {
        let labelled = collect_after_label(&lines[label_idx + 1..]);
        if !labelled.is_empty() {
            return labelled;
        }
    }

    lines
        .iter()
        .filter(|line| GIVEN_WHEN_THEN.is_match(line))
        .map(|line| (*line).to_string())
        .collect()
}

fn collect_after_label(lines: &[&str]) -> Vec<String> {
    let mut criteria = Vec::new();
    for line in lines {
        if line.is_empty() {
            if criteria.is_empty() {
                continue;
            }
            break;
        }
        if BOLD_LABEL.is_match(line) {
            break;
        }
        if let Some(item) = strip_bullet(line) {
            criteria.push(item.to_string());
        } else if GIVEN_WHEN_THEN.is_match(line) {
            criteria.push((*line).to_string());
        }
    }
    criteria
}

fn strip_bullet(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim)
}
