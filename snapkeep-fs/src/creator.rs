//! Snapshot creation.
//!
//! Ensures the directory for the current time bucket exists under the
//! snapshot root. Safe to call any number of times within one bucket.

use std::path::{Path, PathBuf};

use crate::filesystem::{EntryKind, Filesystem, FsError};

/// What `ensure_snapshot` found or did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The directory was created by this call.
    Created(PathBuf),
    /// A directory with the label already existed.
    AlreadyExists(PathBuf),
    /// Something that is not a directory already sits at the label path.
    /// Nothing is created and nothing is removed.
    Occupied(PathBuf),
}

impl CreateOutcome {
    /// Path of the snapshot directory this outcome refers to.
    pub fn path(&self) -> &Path {
        match self {
            CreateOutcome::Created(p) | CreateOutcome::AlreadyExists(p) | CreateOutcome::Occupied(p) => p,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Why `ensure_snapshot` failed.
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("failed to stat snapshot {}: {source}", path.display())]
    Stat { path: PathBuf, source: FsError },

    #[error("failed to create snapshot {}: {source}", path.display())]
    Create { path: PathBuf, source: FsError },
}

impl CreateError {
    pub fn path(&self) -> &Path {
        match self {
            CreateError::Stat { path, .. } | CreateError::Create { path, .. } => path,
        }
    }
}

/// Create `root/label` unless something already exists at that path.
///
/// `root` must already exist. Only a single directory level is created.
pub fn ensure_snapshot<F: Filesystem>(fs: &F, root: &Path, label: &str) -> Result<CreateOutcome, CreateError> {
    let path = root.join(label);

    match fs.entry_kind(&path) {
        Ok(Some(EntryKind::Directory)) => Ok(CreateOutcome::AlreadyExists(path)),
        Ok(Some(EntryKind::Other)) => Ok(CreateOutcome::Occupied(path)),
        Ok(None) => match fs.create_dir(&path) {
            Ok(()) => Ok(CreateOutcome::Created(path)),
            Err(source) => Err(CreateError::Create { path, source }),
        },
        Err(source) => Err(CreateError::Stat { path, source }),
    }
}
