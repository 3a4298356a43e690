//! CLI argument parsing for snapkeep.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use snapkeep_fs::{Granularity, LabelZone};
use thiserror::Error;

use crate::logger::Verbosity;

/// Name of the snapshot root created inside the target path.
pub const SNAPSHOT_DIR_NAME: &str = ".snap";

/// Default retention for every granularity (disabled).
pub const DEFAULT_RETENTION: usize = 0;

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("path must not be empty")]
    EmptyPath,
}

/// snapkeep - create hourly, daily and monthly snapshot directories and
/// keep only the newest N of each.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "snapkeep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target path; snapshots live in its .snap subdirectory (required).
    #[arg(short, long)]
    pub path: PathBuf,

    /// Number of hourly snapshots to retain (0 disables hourly snapshots).
    #[arg(long, default_value_t = DEFAULT_RETENTION)]
    pub hourly: usize,

    /// Number of daily snapshots to retain (0 disables daily snapshots).
    #[arg(long, default_value_t = DEFAULT_RETENTION)]
    pub daily: usize,

    /// Number of monthly snapshots to retain (0 disables monthly snapshots).
    #[arg(long, default_value_t = DEFAULT_RETENTION)]
    pub monthly: usize,

    /// Compute snapshot labels in UTC instead of local time.
    #[arg(long)]
    pub utc: bool,

    /// Increase diagnostic output (-v verbose, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.path.as_os_str().is_empty() {
            return Err(CliError::EmptyPath);
        }
        Ok(())
    }

    /// Retention configured for a granularity. Zero means disabled.
    pub fn retention(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Hourly => self.hourly,
            Granularity::Daily => self.daily,
            Granularity::Monthly => self.monthly,
        }
    }

    /// Directory holding every snapshot directory.
    pub fn snapshot_root(&self) -> PathBuf {
        self.path.join(SNAPSHOT_DIR_NAME)
    }

    /// Time zone for snapshot labels: UTC with `--utc`, local time otherwise.
    pub fn label_zone(&self) -> LabelZone {
        if self.utc {
            LabelZone::Utc
        } else {
            LabelZone::Local
        }
    }

    /// Get verbosity level from the `-v` count.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_count(self.verbose)
    }
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
