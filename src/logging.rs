//! Logging capability injected into the pipeline.
//!
//! Components receive a [`MigrationLog`] at the call boundary instead of
//! writing to a process-wide logger. The binary initializes `env_logger` and
//! passes [`EnvLog`], which forwards to the `log` facade; tests pass
//! [`MemoryLog`] and assert on what was captured.

use std::cell::RefCell;

/// Severity of a log message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Sink for leveled pipeline messages.
pub trait MigrationLog {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Forwards to the `log` facade (backed by `env_logger` in the binary).
pub struct EnvLog;

impl MigrationLog for EnvLog {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => log::info!("{}", message),
            LogLevel::Warn => log::warn!("{}", message),
            LogLevel::Error => log::error!("{}", message),
        }
    }
}

/// Discards all messages.
pub struct NoLog;

impl MigrationLog for NoLog {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Captures messages in memory so tests can assert on logged outcomes.
#[derive(Default)]
pub struct MemoryLog {
    entries: RefCell<Vec<(LogLevel, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.borrow().clone()
    }

    /// True when any captured message at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl MigrationLog for MemoryLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}
