//! Event log collaborator
//!
//! Components report their notable events (button presses, online changes,
//! failures) through an injected [`EventLog`] instead of an ambient logger.
//! [`TracingLog`] forwards to `tracing`; [`MemoryLog`] keeps the records.

use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Severity of a reported event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Notice,
    Warn,
    Error,
}

/// One reported event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

pub trait EventLog: Send + Sync {
    fn record(&self, level: LogLevel, message: &str);

    fn notice(&self, message: &str) {
        self.record(LogLevel::Notice, message);
    }

    fn warn(&self, message: &str) {
        self.record(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(LogLevel::Error, message);
    }
}

/// Forwards records to `tracing`, prefixed with a fixed header
pub struct TracingLog {
    header: String,
}

impl TracingLog {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl EventLog for TracingLog {
    fn record(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Notice => info!("{}{}", self.header, message),
            LogLevel::Warn => warn!("{}{}", self.header, message),
            LogLevel::Error => error!("{}{}", self.header, message),
        }
    }
}

/// Keeps every record in memory
#[derive(Default)]
pub struct MemoryLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Records at the given level
    pub fn at(&self, level: LogLevel) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Take all records, leaving the log empty
    pub fn drain(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl EventLog for MemoryLog {
    fn record(&self, level: LogLevel, message: &str) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_levels() {
        let log = MemoryLog::new();
        assert!(log.is_empty());

        log.notice("Button Mute has state Pressed");
        log.error("channel 99 unavailable");
        log.warn("restart required");

        assert_eq!(log.len(), 3);
        assert_eq!(log.at(LogLevel::Notice), vec!["Button Mute has state Pressed"]);
        assert_eq!(log.at(LogLevel::Error), vec!["channel 99 unavailable"]);

        let drained = log.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[2].level, LogLevel::Warn);
        assert!(log.is_empty());
    }
}
