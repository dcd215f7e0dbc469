//! Core logger types and traits

pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod events;
pub mod formatter;
pub mod log_level;
pub mod log_record;
pub mod log_value;
pub mod logger;
pub mod metrics;
pub mod sink;
pub mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{parse_duration, LoggerConfig};
pub use console::Console;
pub use error::{LoggerError, Result};
pub use events::{EventBus, EventListener, LoggerEvent};
pub use formatter::{format_args, Formatter, OutputFormat, NO_DATA};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use log_value::{ErrorValue, Fields, LogValue};
pub use logger::{Logger, LoggerBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::LoggerMetrics;
pub use sink::{FsStreamFactory, LogStream, Sink, StreamFactory};
pub use timestamp::TimestampFormat;
