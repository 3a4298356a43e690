//! Snapshot rotation.
//!
//! Keeps at most `retention` directories with a given prefix under the
//! snapshot root, removing the oldest first. Age is taken from the name
//! alone: labels are fixed-width, so byte order is chronological order.

use std::path::{Path, PathBuf};

use crate::filesystem::{Filesystem, FsError};

/// A removal that failed. Rotation carries on with the next candidate.
#[derive(Debug)]
pub struct RemovalFailure {
    pub path: PathBuf,
    pub error: FsError,
}

/// Result of a rotation pass for one prefix.
#[derive(Debug, Default)]
pub struct RotationResult {
    /// Names that matched the prefix before rotation, oldest first.
    pub matched: Vec<String>,

    /// Paths removed, oldest first.
    pub removed: Vec<PathBuf>,

    /// Candidates that could not be removed.
    pub failed: Vec<RemovalFailure>,
}

impl RotationResult {
    /// Number of removal candidates (removed plus failed).
    pub fn excess(&self) -> usize {
        self.removed.len() + self.failed.len()
    }

    /// Names that were never candidates for removal, oldest first.
    pub fn kept(&self) -> &[String] {
        &self.matched[self.excess()..]
    }
}

/// Select the names to remove so that at most `retention` remain.
///
/// Sorts `names` in place and returns the oldest excess slice.
pub fn removal_candidates(names: &mut [String], retention: usize) -> &[String] {
    names.sort();
    let excess = names.len().saturating_sub(retention);
    &names[..excess]
}

/// Remove the oldest directories under `root` whose name starts with
/// `prefix` until at most `retention` remain.
///
/// Only directories are considered; other entries and other prefixes are
/// never touched. Removal is non-recursive, so a populated snapshot
/// directory shows up in [`RotationResult::failed`] instead of being
/// deleted. An error is returned only if `root` cannot be listed.
pub fn rotate_snapshots<F: Filesystem>(
    fs: &F,
    root: &Path,
    prefix: &str,
    retention: usize,
) -> Result<RotationResult, FsError> {
    let mut matched: Vec<String> = fs
        .list_dirs(root)?
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect();

    let candidates: Vec<PathBuf> = removal_candidates(&mut matched, retention)
        .iter()
        .map(|name| root.join(name))
        .collect();

    let mut result = RotationResult {
        matched,
        ..Default::default()
    };

    for path in candidates {
        match fs.remove_dir(&path) {
            Ok(()) => result.removed.push(path),
            Err(error) => result.failed.push(RemovalFailure { path, error }),
        }
    }

    Ok(result)
}
