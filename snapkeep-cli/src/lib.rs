//! snapkeep: periodic snapshot directory manager.
//!
//! Creates `hourly-`, `daily-` and `monthly-` marker directories under
//! `<path>/.snap` and keeps only the newest N of each.

pub mod cli;
pub mod commands;
pub mod exit;
pub mod logger;

pub use cli::{parse_from, Cli, CliError, DEFAULT_RETENTION, SNAPSHOT_DIR_NAME};
pub use commands::{execute_snapshot, CommandError, CommandResult, SnapshotSummary};
pub use logger::{Logger, MockLogger, NullLogger, StderrLogger, Verbosity, WriterLogger};
