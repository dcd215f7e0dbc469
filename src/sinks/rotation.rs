//! Daily file naming and retention cleanup
//!
//! Files are named `<YYYY-MM-DD>-<workerId>.log` with the UTC date at the
//! time the file was opened. Retention deletes a worker's own files whose
//! embedded date is at least `keep_days` whole days before today.

use crate::core::{LoggerError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Length of the `YYYY-MM-DD` prefix
pub const DATE_LEN: usize = 10;

pub const LOG_EXTENSION: &str = ".log";

/// Outcome of one retention pass
#[derive(Debug, Default)]
pub struct RetentionReport {
    pub removed: Vec<PathBuf>,
    /// Failures are collected per file and never abort the pass
    pub errors: Vec<LoggerError>,
}

impl RetentionReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RotationManager {
    dir: PathBuf,
    worker_id: String,
    keep_days: u32,
}

impl RotationManager {
    /// `keep_days` of zero disables retention
    pub fn new(dir: impl Into<PathBuf>, worker_id: impl Into<String>, keep_days: u32) -> Self {
        Self {
            dir: dir.into(),
            worker_id: worker_id.into(),
            keep_days,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn keep_days(&self) -> u32 {
        self.keep_days
    }

    /// `2025-01-08-W1.log`
    pub fn file_name(date: NaiveDate, worker_id: &str) -> String {
        format!("{}-{}{}", date.format("%Y-%m-%d"), worker_id, LOG_EXTENSION)
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(Self::file_name(date, &self.worker_id))
    }

    /// File that records written at `now` belong to
    pub fn current_file(&self, now: DateTime<Utc>) -> PathBuf {
        self.path_for(now.date_naive())
    }

    /// Date embedded in the first ten characters of a log file name
    ///
    /// ```
    /// use rust_buffered_logger::sinks::RotationManager;
    ///
    /// let date = RotationManager::parse_file_date("2024-12-31-W0.log").unwrap();
    /// assert_eq!(date.to_string(), "2024-12-31");
    /// assert!(RotationManager::parse_file_date("2025.log").is_err());
    /// ```
    pub fn parse_file_date(name: &str) -> Result<NaiveDate> {
        let prefix = name
            .get(..DATE_LEN)
            .filter(|p| is_date_shape(p.as_bytes()))
            .ok_or_else(|| LoggerError::invalid_file_name(name))?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
            .map_err(|_| LoggerError::invalid_file_name(name))
    }

    /// Whole days between the Unix epoch and `date`
    pub fn days_since_epoch(date: NaiveDate) -> i64 {
        date.signed_duration_since(NaiveDate::default()).num_days()
    }

    /// Time left until the next UTC midnight; never zero
    pub fn until_next_midnight(now: DateTime<Utc>) -> Duration {
        let next = now
            .date_naive()
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());
        match next {
            Some(next) => (next - now)
                .to_std()
                .unwrap_or(Duration::from_secs(1))
                .max(Duration::from_millis(1)),
            None => Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Whether `name` is one of this worker's log files
    pub fn is_own_file(&self, name: &str) -> bool {
        let own_suffix = format!("-{}{}", self.worker_id, LOG_EXTENSION);
        name.ends_with(LOG_EXTENSION)
            && name.get(DATE_LEN..) == Some(own_suffix.as_str())
            && Self::parse_file_date(name).is_ok()
    }

    /// Whether this worker's file `name` is past retention on `today`
    pub fn is_expired(&self, name: &str, today: NaiveDate) -> bool {
        if self.keep_days == 0 || !self.is_own_file(name) {
            return false;
        }
        match Self::parse_file_date(name) {
            Ok(date) => {
                let age = Self::days_since_epoch(today) - Self::days_since_epoch(date);
                age >= i64::from(self.keep_days)
            }
            Err(_) => false,
        }
    }

    /// Delete expired files of this worker
    pub async fn cleanup(&self, now: DateTime<Utc>) -> RetentionReport {
        let mut report = RetentionReport::default();
        if self.keep_days == 0 {
            return report;
        }

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                report.errors.push(LoggerError::io_operation(
                    "listing log directory",
                    self.dir.display().to_string(),
                    e,
                ));
                return report;
            }
        };

        let today = now.date_naive();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    report.errors.push(LoggerError::io_operation(
                        "listing log directory",
                        self.dir.display().to_string(),
                        e,
                    ));
                    break;
                }
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !self.is_expired(name, today) {
                continue;
            }

            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => report.removed.push(path),
                Err(e) => report.errors.push(LoggerError::file_rotation(
                    path.display().to_string(),
                    format!("Failed to remove expired log file: {}", e),
                )),
            }
        }

        report
    }
}

fn is_date_shape(bytes: &[u8]) -> bool {
    bytes.len() == DATE_LEN
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use tempfile::TempDir;

    fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
        now - ChronoDuration::days(days)
    }

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        assert_eq!(RotationManager::file_name(date, "W1"), "2025-01-08-W1.log");

        let manager = RotationManager::new("/var/log/app", "7", 3);
        assert_eq!(
            manager.current_file(noon(2025, 3, 1)),
            PathBuf::from("/var/log/app/2025-03-01-7.log")
        );
    }

    #[test]
    fn test_parse_file_date() {
        let date = RotationManager::parse_file_date("2023-06-15-W1.log").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 6, 15).unwrap());

        for bad in ["", "2025.log", "invalid-date.log", "2025-13-40-W1.log", "2025/01/01-W.log"] {
            let err = RotationManager::parse_file_date(bad).unwrap_err();
            assert!(matches!(err, LoggerError::InvalidFileName { .. }), "{}", bad);
            assert!(err.to_string().contains("Invalid filename"));
        }
    }

    #[test]
    fn test_days_since_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(RotationManager::days_since_epoch(epoch), 0);
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(RotationManager::days_since_epoch(date), 20089);
    }

    #[test]
    fn test_until_next_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 30).single().unwrap();
        assert_eq!(RotationManager::until_next_midnight(now), Duration::from_secs(30));

        let midnight = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap();
        assert_eq!(
            RotationManager::until_next_midnight(midnight),
            Duration::from_secs(24 * 60 * 60)
        );
    }

    #[test]
    fn test_is_own_file() {
        let manager = RotationManager::new("log", "W1", 3);
        assert!(manager.is_own_file("2025-01-01-W1.log"));
        assert!(!manager.is_own_file("2025-01-01-W2.log"));
        assert!(!manager.is_own_file("2025-01-01-W1.txt"));
        assert!(!manager.is_own_file("notes-W1.log"));
    }

    #[test]
    fn test_expiry_boundary() {
        let manager = RotationManager::new("log", "W1", 3);
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert!(!manager.is_expired("2025-01-08-W1.log", today));
        assert!(manager.is_expired("2025-01-07-W1.log", today));

        let disabled = RotationManager::new("log", "W1", 0);
        assert!(!disabled.is_expired("2000-01-01-W1.log", today));
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_own_files() {
        let dir = TempDir::new().unwrap();
        let manager = RotationManager::new(dir.path(), "W1", 3);
        let now = noon(2025, 1, 10);

        for n in 0..=5 {
            let date = days_ago(now, n).date_naive();
            std::fs::write(manager.path_for(date), "x\n").unwrap();
        }
        let foreign = dir.path().join("2024-01-01-W2.log");
        let other = dir.path().join("2024-01-01-W1.txt");
        std::fs::write(&foreign, "x\n").unwrap();
        std::fs::write(&other, "x\n").unwrap();

        let report = manager.cleanup(now).await;
        assert!(report.is_clean());
        assert_eq!(report.removed.len(), 3);

        for n in 0..=5 {
            let path = manager.path_for(days_ago(now, n).date_naive());
            assert_eq!(path.exists(), n < 3, "file {} days old", n);
        }
        assert!(foreign.exists());
        assert!(other.exists());
    }

    #[tokio::test]
    async fn test_cleanup_missing_directory_is_reported() {
        let manager = RotationManager::new("/nonexistent/path/for/testing", "W1", 1);
        let report = manager.cleanup(Utc::now()).await;
        assert!(report.removed.is_empty());
        assert_eq!(report.errors.len(), 1);
    }
}
