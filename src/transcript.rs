use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, bail};
use walkdir::WalkDir;

/// Locate a transcript in `dir`.
///
/// An explicit `specific` filename wins; otherwise the most recently
/// modified `.txt` file is chosen.
pub fn find_transcript(dir: &Path, specific: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(name) = specific {
        let path = dir.join(name);
        if path.is_file() {
            return Ok(path);
        }
        bail!("transcript not found: {}", path.display());
    }

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, path.to_path_buf()));
    }

    if candidates.is_empty() {
        bail!("no .txt transcripts found in {}", dir.display());
    }

    candidates.sort();
    let (_, newest) = candidates.pop().expect("candidates is non-empty");
    if !candidates.is_empty() {
        tracing::info!(
            dir = %dir.display(),
            total = candidates.len() + 1,
            chosen = %newest.display(),
            "multiple transcripts found, using the most recent"
        );
    }
    Ok(newest)
}

/// Read a transcript file, rejecting empty content.
pub fn read_transcript(path: &Path) -> anyhow::Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read transcript {}", path.display()))?;
    let content = content.trim().to_string();
    if content.is_empty() {
        bail!("transcript file is empty: {}", path.display());
    }
    Ok(content)
}
