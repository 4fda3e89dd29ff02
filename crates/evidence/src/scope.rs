use serde::{Deserialize, Serialize};

/// Restricts which relative paths a scan visits.
///
/// Include/exclude entries are path prefixes matched on `/` boundaries (`src` matches
/// `src/app.ts` but not `src2/app.ts`). The file pattern is a substring unless it contains
/// `*` or `?`, in which case it is a glob over the whole relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanScope {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub file_pattern: Option<String>,
}

impl ScanScope {
    /// True when any entry would actually filter something.
    pub fn is_active(&self) -> bool {
        self.include
            .iter()
            .chain(self.exclude.iter())
            .any(|p| !normalize_prefix(p).is_empty())
            || self.pattern().is_some()
    }

    pub fn allows(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.replace('\\', "/");

        let includes: Vec<String> = self
            .include
            .iter()
            .map(|p| normalize_prefix(p))
            .filter(|p| !p.is_empty())
            .collect();
        if !includes.is_empty() && !includes.iter().any(|p| prefix_matches(p, &rel_path)) {
            return false;
        }

        let excluded = self
            .exclude
            .iter()
            .map(|p| normalize_prefix(p))
            .filter(|p| !p.is_empty())
            .any(|p| prefix_matches(&p, &rel_path));
        if excluded {
            return false;
        }

        matches_file_pattern(&rel_path, self.pattern())
    }

    fn pattern(&self) -> Option<&str> {
        self.file_pattern
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

fn normalize_prefix(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while let Some(rest) = value.strip_prefix("./") {
        value = rest.to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

fn matches_file_pattern(path: &str, pattern: Option<&str>) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };

    if !pattern.contains('*') && !pattern.contains('?') {
        return path.contains(pattern);
    }

    match glob::Pattern::new(pattern) {
        Ok(p) => p.matches(path),
        Err(err) => {
            log::warn!("Ignoring invalid file pattern '{pattern}': {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(include: &[&str], exclude: &[&str], pattern: Option<&str>) -> ScanScope {
        ScanScope {
            include: include.iter().map(|s| (*s).to_string()).collect(),
            exclude: exclude.iter().map(|s| (*s).to_string()).collect(),
            file_pattern: pattern.map(str::to_string),
        }
    }

    #[test]
    fn include_is_a_segment_prefix() {
        let s = scope(&["apps/api"], &[], None);
        assert!(s.allows("apps/api/src/rides.ts"));
        assert!(!s.allows("apps/api2/src/rides.ts"));
        assert!(!s.allows("apps/web/page.tsx"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let s = scope(&["apps"], &["apps/legacy"], None);
        assert!(s.allows("apps/api/rides.ts"));
        assert!(!s.allows("apps/legacy/rides.ts"));
    }

    #[test]
    fn pattern_is_substring_or_glob() {
        assert!(scope(&[], &[], Some("rides")).allows("src/rides.ts"));
        assert!(!scope(&[], &[], Some("rides")).allows("src/drivers.ts"));
        assert!(scope(&[], &[], Some("src/*.ts")).allows("src/rides.ts"));
        assert!(!scope(&[], &[], Some("src/*.ts")).allows("src/rides.py"));
    }

    #[test]
    fn blank_entries_do_not_activate_scope() {
        let s = scope(&["", ".", "./", "/"], &["////"], Some("  "));
        assert!(!s.is_active());
        assert!(s.allows("anything/at/all.rs"));
        assert!(!ScanScope::default().is_active());
    }
}
