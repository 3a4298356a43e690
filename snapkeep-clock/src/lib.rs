//! Clock abstraction for snapkeep.
//!
//! A run samples the wall clock exactly once and derives every snapshot label
//! from that sample. Injecting the clock keeps label computation deterministic
//! in tests.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix timestamp.
pub trait Clock: Send + Sync {
    /// Returns the current time as Unix seconds since epoch.
    fn now_unix_sec(&self) -> u64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_sec(&self) -> u64 {
        // A clock set before 1970 is treated as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock frozen at a fixed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockClock {
    timestamp: u64,
}

impl MockClock {
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }

    /// Returns a clock moved forward by `secs`.
    pub fn advanced_by(&self, secs: u64) -> Self {
        Self::new(self.timestamp.saturating_add(secs))
    }
}

impl Clock for MockClock {
    fn now_unix_sec(&self) -> u64 {
        self.timestamp
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_unix_sec(&self) -> u64 {
        (**self).now_unix_sec()
    }
}
