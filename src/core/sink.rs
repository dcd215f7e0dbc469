//! Sink trait for log output destinations

use super::{error::Result, log_record::LogRecord};
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWrite;

/// Destination for rendered records
///
/// `write` is synchronous: it renders the record and hands the bytes to
/// whatever buffering the sink does. Lifecycle operations are async.
///
/// # Example
///
/// ```no_run
/// use rust_buffered_logger::core::{LogRecord, Result, Sink};
/// use async_trait::async_trait;
///
/// struct CountingSink(std::sync::atomic::AtomicUsize);
///
/// #[async_trait]
/// impl Sink for CountingSink {
///     fn name(&self) -> &str {
///         "counting"
///     }
///
///     fn write(&self, _record: &LogRecord<'_>) -> Result<()> {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send + Sync {
    /// Sink name, used in error messages
    fn name(&self) -> &str;

    /// Render and accept one record
    fn write(&self, record: &LogRecord<'_>) -> Result<()>;

    async fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Push accepted records to the underlying device
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Flush and release the destination; must be idempotent
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Byte stream a buffered sink writes into
pub type LogStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Creates the stream behind a file path
///
/// Swappable so tests can inject failing or gated streams.
#[async_trait]
pub trait StreamFactory: Send + Sync {
    async fn create(&self, path: &Path) -> io::Result<LogStream>;
}

/// Opens files in append mode, creating them when missing
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStreamFactory;

#[async_trait]
impl StreamFactory for FsStreamFactory {
    async fn create(&self, path: &Path) -> io::Result<LogStream> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Box::new(file))
    }
}
