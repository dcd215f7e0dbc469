//! Logging macros
//!
//! Arguments are converted with `LogValue::from` and formatted by the
//! logger, so a leading string may use `%s`/`%d`/`%j`/... placeholders.
//!
//! # Examples
//!
//! ```
//! use rust_buffered_logger::prelude::*;
//! use rust_buffered_logger::info;
//!
//! let logger = Logger::builder().to_file(Vec::new()).to_stdout(Vec::new()).build().unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // Placeholder and trailing arguments
//! let port = 8080;
//! info!(logger, "Server listening on port %d", port);
//! info!(logger, "User", 42, "performed action:", "login");
//! ```

/// Build the argument list of a write call.
///
/// # Examples
///
/// ```
/// use rust_buffered_logger::{args, LogValue};
///
/// let values = args!["%s: %d", "retries", 3];
/// assert_eq!(values.len(), 3);
/// assert_eq!(values[2], LogValue::Int(3));
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::LogValue::from($arg)),*]
    };
}

/// Write at the given level with no indentation.
///
/// # Examples
///
/// ```
/// # use rust_buffered_logger::prelude::*;
/// # let logger = Logger::builder().to_file(Vec::new()).to_stdout(Vec::new()).build().unwrap();
/// use rust_buffered_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: %d", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:expr),+ $(,)?) => {
        $logger.write($level, 0, &$crate::args![$($arg),+])
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_buffered_logger::prelude::*;
/// # let logger = Logger::builder().to_file(Vec::new()).to_stdout(Vec::new()).build().unwrap();
/// use rust_buffered_logger::debug;
/// debug!(logger, "Counter value:", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg),+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg),+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_buffered_logger::prelude::*;
/// # let logger = Logger::builder().to_file(Vec::new()).to_stdout(Vec::new()).build().unwrap();
/// use rust_buffered_logger::warn;
/// warn!(logger, "Retry attempt %d of %d", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg),+)
    };
}

/// Log an error-level message.
///
/// Errors can be passed as [`ErrorValue`](crate::ErrorValue)s to keep their
/// stack.
///
/// # Examples
///
/// ```
/// # use rust_buffered_logger::prelude::*;
/// # let logger = Logger::builder().to_file(Vec::new()).to_stdout(Vec::new()).build().unwrap();
/// use rust_buffered_logger::error;
/// error!(logger, ErrorValue::new("connection refused"), "while connecting to", "db:5432");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg),+)
    };
}
