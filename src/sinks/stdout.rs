//! Standard output sink
//!
//! Writes are synchronous and unbuffered so interleaving with other stdout
//! output stays in call order.

use crate::core::{Formatter, LogRecord, LoggerError, OutputFormat, Result, Sink};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Shared writer for captured output in tests and embedding applications
pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

pub struct StdoutSink {
    formatter: Arc<Formatter>,
    format: OutputFormat,
    writer: SharedWriter,
}

impl StdoutSink {
    /// Pretty lines on the process stdout
    pub fn new(formatter: Arc<Formatter>) -> Self {
        Self {
            formatter,
            format: OutputFormat::Pretty,
            writer: Arc::new(Mutex::new(Box::new(io::stdout()))),
        }
    }

    /// `Pretty` or `Json`; `File` lines are accepted too
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Redirect output, e.g. into an in-memory buffer
    #[must_use]
    pub fn with_writer(mut self, writer: SharedWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

#[async_trait]
impl Sink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write(&self, record: &LogRecord<'_>) -> Result<()> {
        let mut line = self.formatter.render(self.format, record);
        line.push('\n');
        self.writer
            .lock()
            .write_all(line.as_bytes())
            .map_err(|e| LoggerError::io_operation("writing to stdout", "write failed", e))
    }

    async fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing stdout", "flush failed", e))
    }
}

impl std::fmt::Debug for StdoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutSink")
            .field("format", &self.format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LogValue};
    use chrono::Utc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_sink(format: OutputFormat) -> (StdoutSink, Capture) {
        let capture = Capture::default();
        let writer: SharedWriter = Arc::new(Mutex::new(Box::new(capture.clone())));
        let sink = StdoutSink::new(Arc::new(Formatter::new("W1").with_colors(false)))
            .with_format(format)
            .with_writer(writer);
        (sink, capture)
    }

    #[test]
    fn test_pretty_line() {
        let (sink, capture) = capture_sink(OutputFormat::Pretty);
        let args = [LogValue::from("hello stdout")];
        sink.write(&LogRecord::new(LogLevel::Warn, 0, Utc::now(), "W1", &args))
            .unwrap();

        let out = String::from_utf8(capture.0.lock().clone()).unwrap();
        assert!(out.ends_with("  W1   warn    hello stdout\n"));
    }

    #[test]
    fn test_json_line() {
        let (sink, capture) = capture_sink(OutputFormat::Json);
        let args = [LogValue::from("structured")];
        sink.write(&LogRecord::new(LogLevel::Info, 0, Utc::now(), "W1", &args))
            .unwrap();

        let out = String::from_utf8(capture.0.lock().clone()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["message"], "structured");
    }
}
