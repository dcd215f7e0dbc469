//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Write or flush against a sink that is closed or was never opened
    #[error("Cannot write to '{target}': logger is not open")]
    NotOpen { target: String },

    /// Underlying stream write failed during a flush
    #[error("Flush failed for '{target}': {message}")]
    FlushFailed { target: String, message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Name does not follow the `YYYY-MM-DD-<worker>.log` layout
    #[error("Invalid filename: '{name}'")]
    InvalidFileName { name: String },

    /// Failure reported by a pluggable sink
    #[error("Sink '{sink}' failed: {message}")]
    SinkError { sink: String, message: String },

    /// Shutdown did not complete in time
    #[error("Logger shutdown did not complete within {0:?}")]
    ShutdownTimeout(std::time::Duration),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a not-open error for the given target
    pub fn not_open(target: impl Into<String>) -> Self {
        LoggerError::NotOpen {
            target: target.into(),
        }
    }

    /// Create a flush failure error
    pub fn flush_failed(target: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FlushFailed {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_file_name(name: impl Into<String>) -> Self {
        LoggerError::InvalidFileName { name: name.into() }
    }

    /// Create a sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkError {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error signals a closed or never-opened target
    #[must_use]
    pub fn is_not_open(&self) -> bool {
        matches!(self, LoggerError::NotOpen { .. })
    }
}
