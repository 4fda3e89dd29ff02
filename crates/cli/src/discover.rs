use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const REQUIREMENTS_DIR: &str = "Requirements";
const CANONICAL_GLOB: &str = "*Canonical_Requirements*.md";

/// The most recently modified canonical requirements document under `dir`.
pub fn find_canonical_document(dir: &Path) -> Result<PathBuf> {
    let pattern = format!(
        "{}/{CANONICAL_GLOB}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in glob::glob(&pattern).context("Invalid document search pattern")? {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                log::warn!("Skipping unreadable candidate: {err}");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let modified = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, path));
    }

    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    let (_, newest) = candidates.into_iter().next().ok_or_else(|| {
        anyhow!(
            "Required file missing: no {CANONICAL_GLOB} under {}",
            dir.display()
        )
    })?;
    log::info!("Using requirements document {}", newest.display());
    Ok(newest)
}

/// `--doc` when given, else discovery under `Requirements/`.
pub fn resolve_document(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(anyhow!("Required file missing: {}", path.display())),
        None => find_canonical_document(Path::new(REQUIREMENTS_DIR)),
    }
}
