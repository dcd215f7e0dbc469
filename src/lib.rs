//! # Rust Buffered Logger
//!
//! A process-local structured logger with buffered file output, daily
//! rotation and retention, and a console-style API.
//!
//! ## Features
//!
//! - **Buffered file output**: records are batched in memory and written by
//!   size threshold, on a timer, or on demand, with at most one write in
//!   flight per file
//! - **Daily files**: `<YYYY-MM-DD>-<workerId>.log`, swapped at UTC midnight,
//!   expired files removed after `keepDays`
//! - **Three line formats**: colorized pretty lines for stdout, one-line
//!   file records, and JSON
//! - **Per-level routing** to the file, stdout and custom [`Sink`]s
//! - **Console API**: groups, counters, timers, assertions, tables
//!
//! ## Example
//!
//! ```no_run
//! use rust_buffered_logger::prelude::*;
//!
//! # async fn example() -> rust_buffered_logger::Result<()> {
//! let logger = Logger::builder()
//!     .path("./log")
//!     .worker_id("W1")
//!     .to_stdout(vec![LogLevel::Warn, LogLevel::Error])
//!     .open()
//!     .await?;
//!
//! let console = logger.console();
//! console.group(&args!["request %s", "GET /"]);
//! console.info(&args!["handled in %dms", 12]);
//! console.group_end();
//!
//! logger.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::args;
    pub use crate::core::{
        Console, ErrorValue, LogLevel, LogValue, Logger, LoggerBuilder, LoggerConfig, LoggerError,
        LoggerEvent, LoggerMetrics, OutputFormat, Result, Sink, TimestampFormat,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use core::{
    Clock, Console, ErrorValue, EventBus, Formatter, LogLevel, LogRecord, LogStream, LogValue,
    Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerEvent, LoggerMetrics, ManualClock,
    OutputFormat, Result, Sink, StreamFactory, SystemClock, TimestampFormat,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use sinks::{BufferedSink, FileSink, RotationManager, StdoutSink};
