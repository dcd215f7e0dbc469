//! Logger metrics for observability
//!
//! Counters for the write path, flushes and file maintenance. All counters
//! are relaxed atomics; read them as a consistent-enough snapshot, not as
//! a synchronization point.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by a logger and its sinks
///
/// # Example
///
/// ```
/// use rust_buffered_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_written();
/// metrics.record_flush(128);
///
/// assert_eq!(metrics.records_written(), 1);
/// assert_eq!(metrics.bytes_flushed(), 128);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records accepted by at least one sink
    records_written: AtomicU64,

    /// Records rejected by a sink (closed, failed to render)
    write_failures: AtomicU64,

    /// Completed flushes of a buffered stream
    flush_count: AtomicU64,

    /// Flushes whose stream write failed
    flush_failures: AtomicU64,

    bytes_flushed: AtomicU64,

    /// Daily file switches
    rotations: AtomicU64,

    /// Expired files deleted by retention
    files_removed: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
            bytes_flushed: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            files_removed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_flushed(&self) -> u64 {
        self.bytes_flushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn files_removed(&self) -> u64 {
        self.files_removed.load(Ordering::Relaxed)
    }

    /// Record an accepted record; returns the previous count
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.records_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a completed flush of `bytes`
    #[inline]
    pub fn record_flush(&self, bytes: usize) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_flushed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flush_failure(&self) -> u64 {
        self.flush_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rotation(&self) -> u64 {
        self.rotations.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_files_removed(&self, count: usize) {
        self.files_removed.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Share of records rejected, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been written.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.write_failures() as f64;
        let total = self.records_written() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_written.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.flush_count.store(0, Ordering::Relaxed);
        self.flush_failures.store(0, Ordering::Relaxed);
        self.bytes_flushed.store(0, Ordering::Relaxed);
        self.rotations.store(0, Ordering::Relaxed);
        self.files_removed.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            records_written: AtomicU64::new(self.records_written()),
            write_failures: AtomicU64::new(self.write_failures()),
            flush_count: AtomicU64::new(self.flush_count()),
            flush_failures: AtomicU64::new(self.flush_failures()),
            bytes_flushed: AtomicU64::new(self.bytes_flushed()),
            rotations: AtomicU64::new(self.rotations()),
            files_removed: AtomicU64::new(self.files_removed()),
        }
    }
}
