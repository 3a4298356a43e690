//! Snapshot labels.
//!
//! A label is a granularity prefix followed by a fixed-width, zero-padded,
//! most-significant-first timestamp with no separators:
//!
//! | granularity | example             |
//! |-------------|---------------------|
//! | hourly      | `hourly-2024010110` |
//! | daily       | `daily-20240101`    |
//! | monthly     | `monthly-202401`    |
//!
//! Within one prefix, byte order of labels is chronological order. Rotation
//! relies on this and never parses timestamps back.

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};

/// Snapshot cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    Hourly,
    Daily,
    Monthly,
}

impl Granularity {
    /// Every granularity, in processing order.
    pub const ALL: [Granularity; 3] = [Granularity::Hourly, Granularity::Daily, Granularity::Monthly];

    /// Directory name prefix, including the trailing dash.
    pub fn prefix(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly-",
            Granularity::Daily => "daily-",
            Granularity::Monthly => "monthly-",
        }
    }

    /// strftime pattern for the timestamp part of the label.
    pub fn timestamp_format(&self) -> &'static str {
        match self {
            Granularity::Hourly => "%Y%m%d%H",
            Granularity::Daily => "%Y%m%d",
            Granularity::Monthly => "%Y%m",
        }
    }

    /// Width of the timestamp part for four-digit years.
    pub fn timestamp_width(&self) -> usize {
        match self {
            Granularity::Hourly => 10,
            Granularity::Daily => 8,
            Granularity::Monthly => 6,
        }
    }

    /// Lowercase name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Time zone used to bucket the clock sample into labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelZone {
    /// Host local time.
    #[default]
    Local,
    Utc,
}

fn format_in<Tz>(dt: DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    dt.format(pattern).to_string()
}

/// Build the label for `granularity` at `ts_unix_sec`.
///
/// Returns `None` if the timestamp cannot be represented as a calendar date.
pub fn snapshot_label(granularity: Granularity, ts_unix_sec: u64, zone: LabelZone) -> Option<String> {
    let secs = i64::try_from(ts_unix_sec).ok()?;
    let pattern = granularity.timestamp_format();

    let stamp = match zone {
        LabelZone::Utc => format_in(Utc.timestamp_opt(secs, 0).single()?, pattern),
        LabelZone::Local => format_in(Local.timestamp_opt(secs, 0).single()?, pattern),
    };

    Some(format!("{}{}", granularity.prefix(), stamp))
}

/// Split a directory name into its granularity and timestamp part.
///
/// Only the prefix is checked; the timestamp part is returned as-is.
pub fn parse_snapshot_label(name: &str) -> Option<(Granularity, &str)> {
    Granularity::ALL
        .iter()
        .find_map(|g| name.strip_prefix(g.prefix()).map(|rest| (*g, rest)))
}
