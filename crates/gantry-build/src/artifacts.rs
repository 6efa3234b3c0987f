//! Artifact collection from the output directory

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use gantry_core::config::target_extension;
use gantry_core::{Arch, BuildError, Result};

/// Glob patterns locating a platform's artifacts.
///
/// Configured patterns win; otherwise one `*.<extension>` pattern per target.
/// Targets without a file extension (e.g. `dir`) contribute nothing.
pub fn artifact_patterns(configured: &[String], targets: &[String]) -> Vec<String> {
    if !configured.is_empty() {
        return configured.to_vec();
    }
    targets
        .iter()
        .map(|t| target_extension(t))
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!("*.{}", ext))
        .collect()
}

/// Files under `out_dir` matching the patterns, in pattern order then sorted
fn matching_files(out_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&out_dir.to_string_lossy());
    let mut files = Vec::new();

    for pattern in patterns {
        let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
        let paths = glob::glob(&full).map_err(|e| BuildError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut matched = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| BuildError::Io(e.into_error()))?;
            if path.is_file() {
                matched.push(path);
            }
        }
        matched.sort();
        files.extend(matched);
    }

    Ok(files)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Matching files present in the output directory before a command runs
///
/// Anything the command leaves untouched is not its artifact: it is either
/// stale output of an earlier build or belongs to another platform.
#[derive(Debug, Default)]
pub struct OutputSnapshot {
    files: HashMap<PathBuf, Fingerprint>,
}

impl OutputSnapshot {
    pub fn capture(out_dir: &Path, patterns: &[String]) -> Result<Self> {
        let files = matching_files(out_dir, patterns)?
            .into_iter()
            .filter_map(|path| Fingerprint::of(&path).map(|fp| (path, fp)))
            .collect();
        Ok(Self { files })
    }

    /// Whether `path` was created or changed since the snapshot
    pub fn is_fresh(&self, path: &Path) -> bool {
        match self.files.get(path) {
            Some(before) => Fingerprint::of(path).as_ref() != Some(before),
            None => true,
        }
    }
}

/// Artifacts under `out_dir` matching the patterns, in pattern order then sorted.
///
/// With a snapshot, only files created or changed since it was taken count.
/// Paths already in `seen` are skipped, and every returned path is added to it.
pub fn collect_artifacts(
    out_dir: &Path,
    patterns: &[String],
    before: Option<&OutputSnapshot>,
    seen: &mut HashSet<PathBuf>,
) -> Result<Vec<PathBuf>> {
    let mut collected = Vec::new();
    for path in matching_files(out_dir, patterns)? {
        if before.is_some_and(|snapshot| !snapshot.is_fresh(&path)) {
            continue;
        }
        if seen.insert(path.clone()) {
            collected.push(path);
        }
    }
    Ok(collected)
}

/// Architecture named in an artifact's file name, e.g. `app-1.0.0-arm64.dmg`
pub fn infer_arch(path: &Path) -> Option<Arch> {
    let name = path.file_name()?.to_string_lossy();
    name.split(|c: char| c == '-' || c == '_' || c == '.')
        .find_map(Arch::parse)
}
