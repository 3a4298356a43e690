//! Command orchestration.
//!
//! snapkeep has a single command: create the current snapshots and rotate
//! old ones for every enabled granularity.

pub mod snapshot;

pub use snapshot::{execute_snapshot, SnapshotSummary};

use std::path::PathBuf;

use crate::cli::CliError;
use snapkeep_fs::FsError;
use thiserror::Error;

/// Fatal errors from command execution.
///
/// Per-snapshot failures are not errors at this level: they are reported
/// through the logger and counted in [`SnapshotSummary::errors`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("failed to create snapshot root {}: {source}", path.display())]
    SnapshotRoot { path: PathBuf, source: FsError },
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;
