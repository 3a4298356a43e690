//! Filesystem abstraction for snapkeep.
//!
//! Every filesystem call the creator and rotator make goes through the
//! [`Filesystem`] trait so the error paths can be exercised with
//! [`MockFilesystem`].

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Errors from filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("path error: {0}")]
    Path(String),
}

impl FsError {
    /// Returns the underlying IO error kind, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            FsError::Io(e) => Some(e.kind()),
            FsError::Path(_) => None,
        }
    }
}

/// What a path resolves to after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Other,
}

/// Trait for filesystem operations.
pub trait Filesystem: Send + Sync {
    /// Stat a path, following symlinks.
    /// Returns `Ok(None)` when nothing exists at the path.
    fn entry_kind(&self, path: &Path) -> Result<Option<EntryKind>, FsError>;

    /// Create a single directory. The parent must exist.
    fn create_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Create directory and parents if needed.
    fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;

    /// List names of the directories directly under `dir`.
    /// Symlinks are not followed; names that are not valid UTF-8 are skipped.
    fn list_dirs(&self, dir: &Path) -> Result<Vec<String>, FsError>;

    /// Remove an empty directory. Never recurses.
    fn remove_dir(&self, path: &Path) -> Result<(), FsError>;
}

/// Permission bits for every directory snapkeep creates, before the umask.
pub const DIR_MODE: u32 = 0o755;

fn dir_builder(recursive: bool) -> fs::DirBuilder {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(recursive);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn entry_kind(&self, path: &Path) -> Result<Option<EntryKind>, FsError> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::Other)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        dir_builder(false).create(path)?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        dir_builder(true).create(path)?;
        Ok(())
    }

    fn list_dirs(&self, dir: &Path) -> Result<Vec<String>, FsError> {
        let mut names = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // DirEntry::file_type does not traverse symlinks
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }

        Ok(names)
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        // rmdir(2): fails on non-empty directories and on files
        fs::remove_dir(path)?;
        Ok(())
    }
}

/// In-memory filesystem for testing.
/// Cloning creates a new handle to the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MockFilesystem {
    state: Arc<RwLock<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    dirs: BTreeSet<PathBuf>,
    files: BTreeSet<PathBuf>,
    fail_stat: HashSet<PathBuf>,
    fail_create: HashSet<PathBuf>,
    fail_list: HashSet<PathBuf>,
    fail_remove: HashSet<PathBuf>,
}

impl MockState {
    fn exists(&self, path: &Path) -> bool {
        self.dirs.contains(path) || self.files.contains(path)
    }

    fn has_children(&self, path: &Path) -> bool {
        self.dirs
            .iter()
            .chain(self.files.iter())
            .any(|p| p.parent() == Some(path))
    }
}

fn injected(path: &Path, op: &str) -> FsError {
    FsError::Io(io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("injected {} failure: {}", op, path.display()),
    ))
}

impl MockFilesystem {
    /// Create an empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory and all of its ancestors (for test setup).
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.state.write().unwrap();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            state.dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Add a regular file, creating its parent directories (for test setup).
    pub fn add_file(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.state.write().unwrap().files.insert(path);
    }

    /// Delete an entry behind the caller's back, as an external process would.
    pub fn vanish(&self, path: &Path) {
        let mut state = self.state.write().unwrap();
        state.dirs.remove(path);
        state.files.remove(path);
    }

    /// Make `entry_kind` fail for `path`.
    pub fn fail_stat(&self, path: impl Into<PathBuf>) {
        self.state.write().unwrap().fail_stat.insert(path.into());
    }

    /// Make `create_dir` and `create_dir_all` fail for `path`.
    pub fn fail_create(&self, path: impl Into<PathBuf>) {
        self.state.write().unwrap().fail_create.insert(path.into());
    }

    /// Make `list_dirs` fail for `path`.
    pub fn fail_list(&self, path: impl Into<PathBuf>) {
        self.state.write().unwrap().fail_list.insert(path.into());
    }

    /// Make `remove_dir` fail for `path`.
    pub fn fail_remove(&self, path: impl Into<PathBuf>) {
        self.state.write().unwrap().fail_remove.insert(path.into());
    }

    /// Check if a directory exists at `path`.
    pub fn is_dir(&self, path: &Path) -> bool {
        self.state.read().unwrap().dirs.contains(path)
    }

    /// Check if a non-directory entry exists at `path`.
    pub fn is_file(&self, path: &Path) -> bool {
        self.state.read().unwrap().files.contains(path)
    }

    /// Sorted names of every directory directly under `dir`.
    pub fn dir_names(&self, dir: &Path) -> Vec<String> {
        self.state
            .read()
            .unwrap()
            .dirs
            .iter()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name()?.to_str().map(String::from))
            .collect()
    }
}

impl Filesystem for MockFilesystem {
    fn entry_kind(&self, path: &Path) -> Result<Option<EntryKind>, FsError> {
        let state = self.state.read().unwrap();
        if state.fail_stat.contains(path) {
            return Err(injected(path, "stat"));
        }
        if state.dirs.contains(path) {
            Ok(Some(EntryKind::Directory))
        } else if state.files.contains(path) {
            Ok(Some(EntryKind::Other))
        } else {
            Ok(None)
        }
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state.write().unwrap();
        if state.fail_create.contains(path) {
            return Err(injected(path, "create"));
        }
        if state.exists(path) {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("already exists: {}", path.display()),
            )));
        }
        match path.parent() {
            Some(parent) if state.dirs.contains(parent) => {
                state.dirs.insert(path.to_path_buf());
                Ok(())
            }
            _ => Err(FsError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent not found: {}", path.display()),
            ))),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        {
            let state = self.state.read().unwrap();
            if state.fail_create.contains(path) {
                return Err(injected(path, "create"));
            }
            if state.files.contains(path) {
                return Err(FsError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("not a directory: {}", path.display()),
                )));
            }
        }
        self.add_dir(path);
        Ok(())
    }

    fn list_dirs(&self, dir: &Path) -> Result<Vec<String>, FsError> {
        {
            let state = self.state.read().unwrap();
            if state.fail_list.contains(dir) {
                return Err(injected(dir, "list"));
            }
            if !state.dirs.contains(dir) {
                return Err(FsError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("directory not found: {}", dir.display()),
                )));
            }
        }
        Ok(self.dir_names(dir))
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state.write().unwrap();
        if state.fail_remove.contains(path) {
            return Err(injected(path, "remove"));
        }
        if state.files.contains(path) {
            return Err(FsError::Path(format!("not a directory: {}", path.display())));
        }
        if !state.dirs.contains(path) {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {}", path.display()),
            )));
        }
        if state.has_children(path) {
            return Err(FsError::Path(format!(
                "directory not empty: {}",
                path.display()
            )));
        }
        state.dirs.remove(path);
        Ok(())
    }
}
