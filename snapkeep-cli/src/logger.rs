//! Reporting sink for snapkeep.
//!
//! Every create, skip, remove and error is reported as one human-readable
//! line through a [`Logger`] handed to the orchestrator, so tests can capture
//! and assert on diagnostics without touching process-wide state.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, RwLock};

/// Verbosity level for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Always shown: every filesystem action and every error.
    Normal,
    /// `-v`: run configuration and per-granularity summaries.
    Verbose,
    /// `-vv`: per-entry detail.
    Debug,
}

impl Verbosity {
    /// Create verbosity from CLI flag count.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }
}

/// Trait for diagnostic output.
pub trait Logger: Send + Sync {
    /// Log a message at the given verbosity level.
    fn log(&self, level: Verbosity, message: &str);

    fn info(&self, message: &str) {
        self.log(Verbosity::Normal, message);
    }

    fn verbose(&self, message: &str) {
        self.log(Verbosity::Verbose, message);
    }

    fn debug(&self, message: &str) {
        self.log(Verbosity::Debug, message);
    }
}

/// Logger writing one line per message to any [`Write`] sink.
#[derive(Debug)]
pub struct WriterLogger<W: Write + Send> {
    level: Verbosity,
    out: Mutex<W>,
}

impl<W: Write + Send> WriterLogger<W> {
    pub fn new(out: W, level: Verbosity) -> Self {
        Self {
            level,
            out: Mutex::new(out),
        }
    }

    pub fn level(&self) -> Verbosity {
        self.level
    }

    /// Consume the logger and return the sink.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Logger for WriterLogger<W> {
    fn log(&self, level: Verbosity, message: &str) {
        if level > self.level {
            return;
        }
        if let Ok(mut out) = self.out.lock() {
            // Write errors are ignored
            let _ = writeln!(out, "{}", message);
        }
    }
}

/// Logger that writes to stderr.
pub type StderrLogger = WriterLogger<io::Stderr>;

impl StderrLogger {
    pub fn stderr(level: Verbosity) -> Self {
        WriterLogger::new(io::stderr(), level)
    }
}

/// A captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Verbosity,
    pub message: String,
}

/// Mock logger for testing that captures all messages regardless of level.
#[derive(Debug, Clone, Default)]
pub struct MockLogger {
    messages: Arc<RwLock<Vec<LogEntry>>>,
}

impl MockLogger {
    /// Create a new mock logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured log entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.messages.read().unwrap().clone()
    }

    /// Get all captured messages (just the text).
    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }

    /// Get messages at a specific level.
    pub fn messages_at_level(&self, level: Verbosity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    /// Check if any message contains the given substring.
    pub fn contains(&self, substring: &str) -> bool {
        self.messages().iter().any(|m| m.contains(substring))
    }

    /// Count messages containing the given substring.
    pub fn count_containing(&self, substring: &str) -> usize {
        self.messages().iter().filter(|m| m.contains(substring)).count()
    }

    /// Clear all captured messages.
    pub fn clear(&self) {
        self.messages.write().unwrap().clear();
    }

    /// Get count of captured messages.
    pub fn count(&self) -> usize {
        self.messages.read().unwrap().len()
    }
}

impl Logger for MockLogger {
    fn log(&self, level: Verbosity, message: &str) {
        self.messages.write().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

/// A no-op logger that discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Verbosity, _message: &str) {}
}
