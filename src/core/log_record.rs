//! Log record structure

use super::log_level::LogLevel;
use super::log_value::LogValue;
use chrono::{DateTime, Utc};

/// One write call, consumed immediately by the formatter and never stored
#[derive(Debug, Clone)]
pub struct LogRecord<'a> {
    pub level: LogLevel,
    pub indent: usize,
    pub timestamp: DateTime<Utc>,
    pub worker_id: &'a str,
    pub args: &'a [LogValue],
}

impl<'a> LogRecord<'a> {
    pub fn new(
        level: LogLevel,
        indent: usize,
        timestamp: DateTime<Utc>,
        worker_id: &'a str,
        args: &'a [LogValue],
    ) -> Self {
        Self {
            level,
            indent,
            timestamp,
            worker_id,
            args,
        }
    }

    /// First argument, used by JSON rendering to decide on field spreading
    #[must_use]
    pub fn first(&self) -> Option<&'a LogValue> {
        self.args.first()
    }
}
