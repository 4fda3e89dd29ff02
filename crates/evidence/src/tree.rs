use crate::error::{EvidenceError, Result};
use crate::limits::DEFAULT_MAX_FILE_BYTES;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Directory names skipped at any depth unless configured otherwise.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    // VCS
    ".git",
    ".hg",
    ".svn",
    // dependencies / builds
    "node_modules",
    ".next",
    ".nuxt",
    ".turbo",
    ".cache",
    "dist",
    "build",
    "out",
    "coverage",
    ".venv",
    "venv",
    "__pycache__",
    ".pytest_cache",
    "target",
    // our own artifacts
    "AgentInput",
    "AgentOutput",
];

/// Read-only snapshot of a codebase.
///
/// Paths are relative, `/`-separated and returned in ascending order so that every scan
/// over the same snapshot visits files identically.
pub trait SourceTree {
    fn files(&self) -> Vec<String>;

    fn read(&self, rel_path: &str) -> Option<String>;
}

/// Codebase on disk, walked with the `ignore` crate.
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
    skip_dirs: Vec<String>,
    respect_gitignore: bool,
    max_file_bytes: u64,
}

impl FsTree {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(EvidenceError::InvalidRoot(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_lowercase()).collect(),
            respect_gitignore: true,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        })
    }

    #[must_use]
    pub fn with_skip_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip_dirs = dirs.into_iter().map(|d| d.as_ref().to_lowercase()).collect();
        self
    }

    #[must_use]
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    #[must_use]
    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_skipped_scope(path: &Path, root: &Path, skip_dirs: &[String]) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        relative.components().any(|component| match component {
            Component::Normal(name) => {
                let lowered = name.to_string_lossy().to_lowercase();
                skip_dirs.iter().any(|skip| skip == &lowered)
            }
            _ => false,
        })
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }
}

impl SourceTree for FsTree {
    fn files(&self) -> Vec<String> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let skip_dirs = self.skip_dirs.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false) // CI lives under .github
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .follow_links(false);
        builder.filter_entry(move |entry| !Self::is_skipped_scope(entry.path(), &root, &skip_dirs));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > self.max_file_bytes {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                self.max_file_bytes
                            );
                            continue;
                        }
                    }

                    if let Some(rel) = self.relative(path) {
                        files.push(rel);
                    }
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::debug!("Found {} files under {}", files.len(), self.root.display());
        files
    }

    fn read(&self, rel_path: &str) -> Option<String> {
        let path = self.root.join(rel_path);
        match std::fs::read(&path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => {
                log::debug!("Failed to read {}: {err}", path.display());
                None
            }
        }
    }
}

/// In-memory snapshot, for synthetic codebases.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    files: BTreeMap<String, String>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        let path = path.into().replace('\\', "/");
        self.files.insert(path, contents.into());
    }
}

impl SourceTree for MemoryTree {
    fn files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn read(&self, rel_path: &str) -> Option<String> {
        self.files.get(rel_path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn walks_sorted_relative_paths_including_hidden_ci() {
        let temp = tempdir().unwrap();
        let workflows = temp.path().join(".github").join("workflows");
        fs::create_dir_all(&workflows).unwrap();
        fs::write(workflows.join("ci.yml"), "name: CI\n").unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src").join("b.ts"), "").unwrap();
        fs::write(temp.path().join("src").join("a.ts"), "").unwrap();

        let tree = FsTree::new(temp.path()).unwrap();
        assert_eq!(
            tree.files(),
            vec![".github/workflows/ci.yml", "src/a.ts", "src/b.ts"]
        );
    }

    #[test]
    fn skips_configured_directories_at_any_depth() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("apps").join("web").join("node_modules").join("x");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("index.js"), "app.get('/x', h)").unwrap();
        let output = temp.path().join("AgentOutput");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("requirements_status.md"), "").unwrap();
        fs::write(temp.path().join("server.js"), "").unwrap();

        let tree = FsTree::new(temp.path()).unwrap();
        assert_eq!(tree.files(), vec!["server.js"]);
    }

    #[test]
    fn honours_gitignore_unless_disabled() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".gitignore"), "generated/\n").unwrap();
        fs::create_dir_all(temp.path().join("generated")).unwrap();
        fs::write(temp.path().join("generated").join("api.ts"), "").unwrap();

        let respecting = FsTree::new(temp.path()).unwrap();
        assert!(respecting.files().iter().all(|p| !p.starts_with("generated/")));

        let all = FsTree::new(temp.path()).unwrap().respect_gitignore(false);
        assert!(all.files().iter().any(|p| p == "generated/api.ts"));
    }

    #[test]
    fn skips_files_over_the_size_cap() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("big.sql"), vec![b'x'; 64]).unwrap();
        fs::write(temp.path().join("small.sql"), b"x").unwrap();

        let tree = FsTree::new(temp.path()).unwrap().max_file_bytes(16);
        assert_eq!(tree.files(), vec!["small.sql"]);
    }

    #[test]
    fn reads_invalid_utf8_lossily() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("odd.ts"), [b'o', b'k', 0xff]).unwrap();
        let tree = FsTree::new(temp.path()).unwrap();
        let text = tree.read("odd.ts").unwrap();
        assert!(text.starts_with("ok"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().unwrap();
        let err = FsTree::new(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, EvidenceError::InvalidRoot(_)));
    }

    #[test]
    fn memory_tree_normalises_separators() {
        let tree = MemoryTree::new().with_file(r"src\b.ts", "b").with_file("src/a.ts", "a");
        assert_eq!(tree.files(), vec!["src/a.ts", "src/b.ts"]);
        assert_eq!(tree.read("src/b.ts").as_deref(), Some("b"));
    }
}
