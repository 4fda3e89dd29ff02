use crate::text::line_of_offset;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

static CREATE_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bcreate\s+table\s+(?:if\s+not\s+exists\s+)?([A-Za-z0-9_".]+)\s*\("#)
        .expect("valid create table regex")
});

static ALTER_ADD_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\balter\s+table\s+(?:if\s+exists\s+)?(?:only\s+)?([A-Za-z0-9_".]+)\s+add\s+column\s+(?:if\s+not\s+exists\s+)?([A-Za-z0-9_".]+)\s+([A-Za-z0-9_"\[\]().]+)"#,
    )
    .expect("valid alter table regex")
});

/// Leading words of table-level clauses inside a `CREATE TABLE` body.
const CONSTRAINT_KEYWORDS: &[&str] = &[
    "constraint",
    "primary",
    "foreign",
    "unique",
    "check",
    "exclude",
    "key",
    "index",
    "like",
];

/// Words that end a column's type inside its definition.
const COLUMN_MODIFIERS: &[&str] = &[
    "not",
    "null",
    "default",
    "primary",
    "references",
    "unique",
    "check",
    "constraint",
    "generated",
    "collate",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub sql_type: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub columns: BTreeMap<String, ColumnDef>,
    /// Migration files that created or altered this table
    pub sources: BTreeSet<String>,
}

/// Tables and columns declared by SQL migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    pub tables: BTreeMap<String, TableDef>,
    pub migration_files: Vec<String>,
}

impl SchemaCatalog {
    pub fn is_migration_file(rel_path: &str) -> bool {
        let mut parts = rel_path.split('/').collect::<Vec<_>>();
        let Some(name) = parts.pop() else {
            return false;
        };
        name.to_lowercase().ends_with(".sql")
            && parts.iter().any(|p| p.eq_ignore_ascii_case("migrations"))
    }

    /// Fold one migration file into the catalog. Files must be applied in path order so
    /// later `ALTER TABLE`s override earlier definitions.
    pub fn apply_migration(&mut self, rel_path: &str, sql: &str) {
        self.migration_files.push(rel_path.to_string());
        let sql = blank_comments(sql);
        let sql = sql.as_str();

        for caps in CREATE_TABLE.captures_iter(sql) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let table_name = normalize_ident(name.as_str());
            let body_start = whole.end();
            let body = balanced_body(&sql[body_start..]);

            let table = self.tables.entry(table_name).or_default();
            table.sources.insert(rel_path.to_string());
            for (offset, definition) in split_top_level(body) {
                if let Some((column, sql_type)) = parse_column(definition) {
                    table.columns.insert(
                        column,
                        ColumnDef {
                            sql_type,
                            file: rel_path.to_string(),
                            line: line_of_offset(sql, body_start + offset),
                        },
                    );
                }
            }
        }

        for caps in ALTER_ADD_COLUMN.captures_iter(sql) {
            let (Some(whole), Some(table), Some(column), Some(sql_type)) =
                (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };
            let table = self
                .tables
                .entry(normalize_ident(table.as_str()))
                .or_default();
            table.sources.insert(rel_path.to_string());
            table.columns.insert(
                normalize_ident(column.as_str()),
                ColumnDef {
                    sql_type: sql_type.as_str().trim().to_string(),
                    file: rel_path.to_string(),
                    line: line_of_offset(sql, whole.start()),
                },
            );
        }
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }
}

/// Strip quotes from each dotted part: `"public"."rides"` becomes `public.rides`.
pub fn normalize_ident(raw: &str) -> String {
    raw.trim()
        .split('.')
        .map(|part| part.trim().trim_matches('"'))
        .collect::<Vec<_>>()
        .join(".")
}

/// Text up to (not including) the parenthesis closing the one just opened.
fn balanced_body(rest: &str) -> &str {
    let mut depth = 1usize;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &rest[..idx];
                }
            }
            _ => {}
        }
    }
    rest
}

/// Split on commas at parenthesis depth zero, keeping each piece's byte offset.
fn split_top_level(body: &str) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(trimmed_piece(body, start, idx));
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(trimmed_piece(body, start, body.len()));
    pieces.into_iter().filter(|(_, p)| !p.is_empty()).collect()
}

fn trimmed_piece(body: &str, start: usize, end: usize) -> (usize, &str) {
    let raw = &body[start..end];
    let leading = raw.len() - raw.trim_start().len();
    (start + leading, raw.trim())
}

/// Replace `--` and `/* */` comment bytes with spaces, keeping newlines so byte offsets
/// and line numbers match the original text. Quoted strings and identifiers are left alone.
fn blank_comments(sql: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Quoted(u8),
        Line,
        Block,
    }

    let bytes = sql.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    let mut idx = 0;
    while idx < bytes.len() {
        let b = bytes[idx];
        let next = bytes.get(idx + 1).copied();
        match state {
            State::Code => match (b, next) {
                (b'-', Some(b'-')) => {
                    state = State::Line;
                    out.extend_from_slice(b"  ");
                    idx += 2;
                    continue;
                }
                (b'/', Some(b'*')) => {
                    state = State::Block;
                    out.extend_from_slice(b"  ");
                    idx += 2;
                    continue;
                }
                (b'\'' | b'"', _) => {
                    state = State::Quoted(b);
                    out.push(b);
                }
                _ => out.push(b),
            },
            State::Quoted(quote) => {
                if b == quote {
                    state = State::Code;
                }
                out.push(b);
            }
            State::Line => {
                if b == b'\n' {
                    state = State::Code;
                    out.push(b);
                } else {
                    out.push(b' ');
                }
            }
            State::Block => {
                if b == b'*' && next == Some(b'/') {
                    state = State::Code;
                    out.extend_from_slice(b"  ");
                    idx += 2;
                    continue;
                }
                out.push(if b == b'\n' { b'\n' } else { b' ' });
            }
        }
        idx += 1;
    }
    // Only ASCII bytes inside comments were replaced, so the buffer is still UTF-8.
    String::from_utf8_lossy(&out).into_owned()
}

fn parse_column(definition: &str) -> Option<(String, String)> {
    let mut words = definition.split_whitespace();
    let name = words.next()?;
    if CONSTRAINT_KEYWORDS.contains(&name.to_lowercase().as_str()) {
        return None;
    }
    let type_words: Vec<&str> = words
        .take_while(|w| !COLUMN_MODIFIERS.contains(&w.to_lowercase().as_str()))
        .collect();
    if type_words.is_empty() {
        return None;
    }
    Some((normalize_ident(name), type_words.join(" ")))
}
