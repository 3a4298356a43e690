//! Exit codes for snapkeep.
//!
//! A run that gets past snapshot root creation exits with `SUCCESS` even if
//! individual snapshot operations failed; those failures are only visible
//! on stderr.

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution, possibly with reported per-snapshot errors.
    pub const SUCCESS: u8 = 0;
    /// Invalid arguments.
    pub const INVALID_ARGS: u8 = 1;
    /// Snapshot root could not be created.
    pub const IO_ERROR: u8 = 2;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> u8 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::SnapshotRoot { .. } => codes::IO_ERROR,
    }
}
