//! Logger configuration
//!
//! `LoggerConfig` deserializes from camelCase JSON (or any serde format):
//!
//! ```json
//! {
//!   "path": "./log",
//!   "workerId": "W1",
//!   "writeInterval": "3s",
//!   "writeBuffer": 65536,
//!   "keepDays": 5,
//!   "toFile": ["info", "warn", "error"],
//!   "toStdout": [],
//!   "json": false,
//!   "home": "/srv/app"
//! }
//! ```
//!
//! Level lists: absent means every level, an empty list means none.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PATH: &str = "./log";
pub const DEFAULT_WORKER_ID: &str = "0";
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_WRITE_BUFFER: usize = 64 * 1024;
pub const DEFAULT_KEEP_DAYS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    /// Directory of the daily files
    pub path: PathBuf,
    /// Identifies this process in file names and lines
    pub worker_id: String,
    /// Period of the background flush; zero disables it
    #[serde(alias = "writeInterval", with = "duration_value")]
    pub flush_interval: Duration,
    /// Buffered bytes that trigger a flush
    pub write_buffer: usize,
    /// Retention in days; zero keeps every file
    pub keep_days: u32,
    pub to_file: Option<Vec<LogLevel>>,
    pub to_stdout: Option<Vec<LogLevel>>,
    /// JSON lines instead of file/pretty lines
    pub json: bool,
    /// Prefix stripped from error and debug output
    pub home: Option<String>,
    pub colors: bool,
    pub timestamp_format: TimestampFormat,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            worker_id: DEFAULT_WORKER_ID.to_string(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            write_buffer: DEFAULT_WRITE_BUFFER,
            keep_days: DEFAULT_KEEP_DAYS,
            to_file: None,
            to_stdout: None,
            json: false,
            home: None,
            colors: true,
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl LoggerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn file_enabled(&self, level: LogLevel) -> bool {
        enabled(&self.to_file, level)
    }

    pub fn stdout_enabled(&self, level: LogLevel) -> bool {
        enabled(&self.to_stdout, level)
    }

    /// Whether any level is routed to the daily file
    pub fn has_file_output(&self) -> bool {
        LogLevel::ALL.iter().any(|level| self.file_enabled(*level))
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_id.is_empty() {
            return Err(LoggerError::config("workerId", "must not be empty"));
        }
        if self
            .worker_id
            .chars()
            .any(|c| std::path::is_separator(c) || c.is_control())
        {
            return Err(LoggerError::config(
                "workerId",
                format!("'{}' cannot be used in a file name", self.worker_id),
            ));
        }
        if self.has_file_output() && self.path.as_os_str().is_empty() {
            return Err(LoggerError::config(
                "path",
                "a log directory is required when file output is enabled",
            ));
        }
        Ok(())
    }
}

fn enabled(levels: &Option<Vec<LogLevel>>, level: LogLevel) -> bool {
    match levels {
        None => true,
        Some(levels) => levels.contains(&level),
    }
}

/// Parse `"500ms"`, `"3s"`, `"2m"`, `"1h"`, `"1d"`; a bare number is milliseconds
///
/// ```
/// use rust_buffered_logger::core::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
/// assert_eq!(parse_duration("250"), Ok(Duration::from_millis(250)));
/// ```
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (num_str, unit) = s.split_at(split);

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: {}", s))?;

    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "ms" => 1,
        "s" => 1000,
        "m" => 60 * 1000,
        "h" => 60 * 60 * 1000,
        "d" => 24 * 60 * 60 * 1000,
        other => return Err(format!("invalid unit: {}, supported: ms/s/m/h/d", other)),
    };

    num.checked_mul(multiplier)
        .map(Duration::from_millis)
        .ok_or_else(|| "duration too large".to_string())
}

mod duration_value {
    use super::parse_duration;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Duration that can be a number of milliseconds or a string with units
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DurationValue {
        Millis(u64),
        Text(String),
    }

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match DurationValue::deserialize(deserializer)? {
            DurationValue::Millis(ms) => Ok(Duration::from_millis(ms)),
            DurationValue::Text(text) => parse_duration(&text).map_err(de::Error::custom),
        }
    }
}
