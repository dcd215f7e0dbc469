//! Main logger implementation
//!
//! A `Logger` owns a routing table from level to sinks. Built-in sinks are
//! the daily file (buffered) and stdout; further sinks can be attached with
//! [`Logger::load_sinks`]. `write` never fails: sink errors are reported
//! through [`LoggerEvent::Error`].

use super::{
    clock::{Clock, SystemClock},
    config::LoggerConfig,
    console::{Console, ConsoleState},
    error::{LoggerError, Result},
    events::{EventBus, LoggerEvent},
    formatter::{Formatter, OutputFormat},
    log_level::LogLevel,
    log_record::LogRecord,
    log_value::LogValue,
    metrics::LoggerMetrics,
    sink::{FsStreamFactory, Sink, StreamFactory},
};
use crate::sinks::{BufferOptions, FileSink, FileSinkOptions, SharedWriter, StdoutSink};
use crossbeam_channel::Receiver;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default shutdown timeout for logger cleanup (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

type Routes = [Vec<Arc<dyn Sink>>; 5];

struct Inner {
    config: LoggerConfig,
    clock: Arc<dyn Clock>,
    events: EventBus,
    metrics: Arc<LoggerMetrics>,
    file: Option<Arc<FileSink>>,
    stdout: Option<Arc<StdoutSink>>,
    plugins: RwLock<Vec<Arc<dyn Sink>>>,
    routes: RwLock<Routes>,
    console: Arc<Mutex<ConsoleState>>,
    active: AtomicBool,
    /// Serializes open and close
    lifecycle: tokio::sync::Mutex<()>,
}

/// Process-local logger; cheap to clone
///
/// # Example
///
/// ```no_run
/// use rust_buffered_logger::prelude::*;
///
/// # async fn example() -> rust_buffered_logger::Result<()> {
/// let logger = Logger::builder()
///     .path("./log")
///     .worker_id("W1")
///     .keep_days(5)
///     .open()
///     .await?;
///
/// logger.write(LogLevel::Info, 0, &args!["listening on port %d", 8080]);
/// logger.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl Logger {
    /// Build from a configuration without opening
    pub fn new(config: LoggerConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Build from a configuration and open
    pub async fn create(config: LoggerConfig) -> Result<Self> {
        Self::builder().config(config).open().await
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.inner.config
    }

    pub fn worker_id(&self) -> &str {
        &self.inner.config.worker_id
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// File currently written to, when file output is enabled and open
    pub fn file_path(&self) -> Option<PathBuf> {
        self.inner.file.as_ref().and_then(|file| file.current_path())
    }

    pub fn file_sink(&self) -> Option<&FileSink> {
        self.inner.file.as_deref()
    }

    /// Prepare every destination; a second call is a no-op
    ///
    /// Without file output this touches nothing on disk. If a destination
    /// fails to open, the ones already opened are closed again.
    pub async fn open(&self) -> Result<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.is_active() {
            return Ok(());
        }

        if let Some(file) = &self.inner.file {
            file.open().await?;
        }
        let plugins = self.inner.plugins.read().clone();
        for (i, plugin) in plugins.iter().enumerate() {
            if let Err(e) = plugin.open().await {
                self.release(&plugins[..i]).await;
                return Err(LoggerError::sink(plugin.name(), e.to_string()));
            }
        }

        self.inner.active.store(true, Ordering::Release);
        self.inner.events.emit(LoggerEvent::Open);
        Ok(())
    }

    /// Flush and release every destination; a second call is a no-op
    ///
    /// All sinks are closed even when one fails; the first failure is
    /// returned. If the file could not be drained at all, nothing else is
    /// closed and the logger stays open so `close` can be retried.
    pub async fn close(&self) -> Result<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if !self.is_active() {
            return Ok(());
        }

        let mut first_err = None;
        if let Some(file) = &self.inner.file {
            if let Err(e) = file.close().await {
                if file.is_open() {
                    return Err(e);
                }
                first_err.get_or_insert(e);
            }
        }
        let plugins = self.inner.plugins.read().clone();
        for plugin in &plugins {
            if let Err(e) = plugin.close().await {
                first_err.get_or_insert(e);
            }
        }
        if let Some(stdout) = &self.inner.stdout {
            if let Err(e) = stdout.flush().await {
                first_err.get_or_insert(e);
            }
        }

        self.inner.active.store(false, Ordering::Release);
        self.inner.events.emit(LoggerEvent::Close);
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close the file and `plugins` after a failed open
    async fn release(&self, plugins: &[Arc<dyn Sink>]) {
        let file = self.inner.file.iter().map(|f| f.clone() as Arc<dyn Sink>);
        for sink in file.chain(plugins.iter().cloned()) {
            if let Err(e) = sink.close().await {
                self.inner.events.emit_error(e);
            }
        }
    }

    /// Render and hand `args` to every sink routed for `level`
    pub fn write(&self, level: LogLevel, indent: usize, args: &[LogValue]) {
        let sinks = self.inner.routes.read()[level.index()].clone();
        if sinks.is_empty() {
            return;
        }

        let record = LogRecord::new(level, indent, self.inner.clock.now(), self.worker_id(), args);
        let mut accepted = false;
        for sink in &sinks {
            match sink.write(&record) {
                Ok(()) => accepted = true,
                Err(e) => {
                    self.inner.metrics.record_write_failure();
                    self.inner.events.emit_error(e);
                }
            }
        }
        if accepted {
            self.inner.metrics.record_written();
        }
    }

    pub fn log(&self, args: &[LogValue]) {
        self.write(LogLevel::Log, 0, args);
    }

    pub fn info(&self, args: &[LogValue]) {
        self.write(LogLevel::Info, 0, args);
    }

    pub fn warn(&self, args: &[LogValue]) {
        self.write(LogLevel::Warn, 0, args);
    }

    pub fn debug(&self, args: &[LogValue]) {
        self.write(LogLevel::Debug, 0, args);
    }

    pub fn error(&self, args: &[LogValue]) {
        self.write(LogLevel::Error, 0, args);
    }

    /// Push buffered records to their devices
    ///
    /// Fails with [`LoggerError::NotOpen`] on a closed logger with file
    /// output.
    pub async fn flush(&self) -> Result<()> {
        if let Some(file) = &self.inner.file {
            if !self.is_active() {
                return Err(LoggerError::not_open(
                    self.inner.config.path.display().to_string(),
                ));
            }
            file.flush().await?;
        }
        let plugins = self.inner.plugins.read().clone();
        for plugin in &plugins {
            plugin.flush().await?;
        }
        if let Some(stdout) = &self.inner.stdout {
            stdout.flush().await?;
        }
        Ok(())
    }

    /// Run retention now; returns the removed files
    pub async fn rotate(&self) -> Vec<PathBuf> {
        match &self.inner.file {
            Some(file) => file.cleanup().await,
            None => Vec::new(),
        }
    }

    /// Switch to the file of the current date without waiting for midnight
    pub async fn rollover(&self) -> Result<()> {
        match &self.inner.file {
            Some(file) => file.rollover().await,
            None => Ok(()),
        }
    }

    /// Open `sinks` and route `levels` to them
    ///
    /// Nothing is attached if any sink fails to open; the ones already
    /// opened are closed again.
    pub async fn load_sinks(&self, levels: &[LogLevel], sinks: Vec<Arc<dyn Sink>>) -> Result<()> {
        for (i, sink) in sinks.iter().enumerate() {
            if let Err(e) = sink.open().await {
                for opened in &sinks[..i] {
                    if let Err(close_err) = opened.close().await {
                        self.inner.events.emit_error(close_err);
                    }
                }
                return Err(LoggerError::sink(sink.name(), e.to_string()));
            }
        }

        {
            let mut routes = self.inner.routes.write();
            for level in levels {
                routes[level.index()].extend(sinks.iter().cloned());
            }
        }
        self.inner.plugins.write().extend(sinks);
        Ok(())
    }

    /// Receiver of every subsequent [`LoggerEvent`]
    pub fn subscribe(&self) -> Receiver<LoggerEvent> {
        self.inner.events.subscribe()
    }

    /// Register a callback invoked on every [`LoggerEvent`]
    pub fn on_event<F>(&self, listener: F)
    where
        F: Fn(&LoggerEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(listener);
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.inner.metrics
    }

    /// Console-style API writing through this logger
    ///
    /// Every handle shares the logger's indentation, counters and timers.
    pub fn console(&self) -> Console {
        Console::attach(self.clone(), self.inner.console.clone())
    }

    /// Close, giving up after `timeout`
    ///
    /// Intended for the embedding application's own termination handling.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_buffered_logger::{Logger, LoggerConfig, DEFAULT_SHUTDOWN_TIMEOUT};
    ///
    /// # async fn example() -> rust_buffered_logger::Result<()> {
    /// let logger = Logger::create(LoggerConfig::default()).await?;
    /// if let Err(e) = logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT).await {
    ///     eprintln!("Warning: {}", e);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.close())
            .await
            .map_err(|_| LoggerError::ShutdownTimeout(timeout))?
    }

    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("worker_id", &self.worker_id())
            .field("active", &self.is_active())
            .field("file", &self.file_path())
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let buffered = self
            .file
            .as_ref()
            .and_then(|file| file.buffered())
            .map_or(0, |sink| sink.buffered_bytes());
        if buffered > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger dropped without close(); {} buffered bytes were not written",
                buffered
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_buffered_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .to_file(Vec::new())
///     .to_stdout(vec![LogLevel::Warn, LogLevel::Error])
///     .json(true)
///     .build()
///     .unwrap();
/// assert!(logger.file_path().is_none());
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    factory: Arc<dyn StreamFactory>,
    clock: Arc<dyn Clock>,
    stdout_writer: Option<SharedWriter>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            factory: Arc::new(FsStreamFactory),
            clock: Arc::new(SystemClock),
            stdout_writer: None,
        }
    }

    /// Replace every configuration value at once
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.path = path.as_ref().to_path_buf();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.config.worker_id = worker_id.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn write_buffer(mut self, bytes: usize) -> Self {
        self.config.write_buffer = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn keep_days(mut self, days: u32) -> Self {
        self.config.keep_days = days;
        self
    }

    /// Levels written to the daily file; empty disables file output
    #[must_use = "builder methods return a new value"]
    pub fn to_file(mut self, levels: Vec<LogLevel>) -> Self {
        self.config.to_file = Some(levels);
        self
    }

    /// Levels written to stdout; empty disables stdout output
    #[must_use = "builder methods return a new value"]
    pub fn to_stdout(mut self, levels: Vec<LogLevel>) -> Self {
        self.config.to_stdout = Some(levels);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn json(mut self, json: bool) -> Self {
        self.config.json = json;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn home(mut self, home: impl Into<String>) -> Self {
        self.config.home = Some(home.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, colors: bool) -> Self {
        self.config.colors = colors;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: super::timestamp::TimestampFormat) -> Self {
        self.config.timestamp_format = format;
        self
    }

    /// Source of file streams (defaults to the filesystem)
    #[must_use = "builder methods return a new value"]
    pub fn stream_factory(mut self, factory: Arc<dyn StreamFactory>) -> Self {
        self.factory = factory;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Destination of stdout lines (defaults to the process stdout)
    #[must_use = "builder methods return a new value"]
    pub fn stdout_writer(mut self, writer: SharedWriter) -> Self {
        self.stdout_writer = Some(writer);
        self
    }

    /// Build the Logger without opening it
    pub fn build(self) -> Result<Logger> {
        let config = self.config;
        config.validate()?;

        let formatter = Arc::new(
            Formatter::new(config.worker_id.clone())
                .with_home(config.home.clone())
                .with_colors(config.colors)
                .with_timestamp_format(config.timestamp_format.clone()),
        );
        let events = EventBus::new();
        let metrics = Arc::new(LoggerMetrics::new());

        let file = config.has_file_output().then(|| {
            Arc::new(FileSink::new(
                FileSinkOptions {
                    dir: config.path.clone(),
                    worker_id: config.worker_id.clone(),
                    keep_days: config.keep_days,
                    buffer: BufferOptions {
                        write_buffer: config.write_buffer,
                        flush_interval: config.flush_interval,
                    },
                    format: if config.json {
                        OutputFormat::Json
                    } else {
                        OutputFormat::File
                    },
                },
                formatter.clone(),
                self.factory,
                self.clock.clone(),
                events.clone(),
                metrics.clone(),
            ))
        });

        let has_stdout = LogLevel::ALL.iter().any(|l| config.stdout_enabled(*l));
        let stdout = has_stdout.then(|| {
            let format = if config.json {
                OutputFormat::Json
            } else {
                OutputFormat::Pretty
            };
            let sink = StdoutSink::new(formatter.clone()).with_format(format);
            Arc::new(match self.stdout_writer {
                Some(writer) => sink.with_writer(writer),
                None => sink,
            })
        });

        let routes: Routes = std::array::from_fn(|i| {
            let level = LogLevel::ALL[i];
            let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
            if let Some(file) = file.as_ref().filter(|_| config.file_enabled(level)) {
                sinks.push(file.clone());
            }
            if let Some(stdout) = stdout.as_ref().filter(|_| config.stdout_enabled(level)) {
                sinks.push(stdout.clone());
            }
            sinks
        });

        Ok(Logger {
            inner: Arc::new(Inner {
                config,
                clock: self.clock,
                events,
                metrics,
                file,
                stdout,
                plugins: RwLock::new(Vec::new()),
                routes: RwLock::new(routes),
                console: Arc::new(Mutex::new(ConsoleState::default())),
                active: AtomicBool::new(false),
                lifecycle: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Build and open the Logger
    pub async fn open(self) -> Result<Logger> {
        let logger = self.build()?;
        logger.open().await?;
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::{self, Write};
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .map(str::to_string)
                .collect()
        }

        fn writer(&self) -> SharedWriter {
            Arc::new(Mutex::new(Box::new(self.clone())))
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn stdout_logger(capture: &Capture) -> Logger {
        Logger::builder()
            .worker_id("W1")
            .to_file(Vec::new())
            .colors(false)
            .stdout_writer(capture.writer())
            .build()
            .unwrap()
    }

    #[test]
    fn test_routing_respects_levels() {
        let capture = Capture::default();
        let logger = Logger::builder()
            .to_file(Vec::new())
            .to_stdout(vec![LogLevel::Error])
            .colors(false)
            .stdout_writer(capture.writer())
            .build()
            .unwrap();

        logger.info(&[LogValue::from("hidden")]);
        logger.error(&[LogValue::from("shown")]);

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("shown"));
        assert_eq!(logger.metrics().records_written(), 1);
    }

    #[test]
    fn test_file_output_requires_path() {
        let result = Logger::builder().path("").build();
        assert!(matches!(
            result,
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_close_events() {
        let capture = Capture::default();
        let logger = stdout_logger(&capture);
        let events = logger.subscribe();

        logger.open().await.unwrap();
        logger.open().await.unwrap();
        logger.close().await.unwrap();
        logger.close().await.unwrap();

        let events: Vec<LoggerEvent> = events.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LoggerEvent::Open));
        assert!(matches!(events[1], LoggerEvent::Close));
    }

    #[tokio::test]
    async fn test_flush_without_file_output() {
        let capture = Capture::default();
        let logger = stdout_logger(&capture);
        tokio_test::assert_ok!(logger.flush().await);
    }

    #[tokio::test]
    async fn test_shutdown_closes() {
        let capture = Capture::default();
        let logger = stdout_logger(&capture);
        logger.open().await.unwrap();
        logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT).await.unwrap();
        assert!(!logger.is_active());
    }

    /// Sink that opens once and refuses every later open
    #[derive(Default)]
    struct OpensOnce {
        opens: AtomicUsize,
        closes: AtomicUsize,
    }

    #[async_trait]
    impl Sink for OpensOnce {
        fn name(&self) -> &str {
            "opens-once"
        }

        fn write(&self, _record: &LogRecord<'_>) -> Result<()> {
            Ok(())
        }

        async fn open(&self) -> Result<()> {
            if self.opens.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(LoggerError::sink("opens-once", "already used"));
            }
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_open_releases_file() {
        let dir = TempDir::new().unwrap();
        let logger = Logger::builder()
            .path(dir.path())
            .worker_id("W1")
            .to_stdout(Vec::new())
            .flush_interval(Duration::ZERO)
            .build()
            .unwrap();
        let sink = Arc::new(OpensOnce::default());

        logger.open().await.unwrap();
        logger
            .load_sinks(&LogLevel::ALL, vec![sink.clone() as Arc<dyn Sink>])
            .await
            .unwrap();
        logger.info(&[LogValue::from("kept")]);
        let path = logger.file_path().unwrap();
        logger.close().await.unwrap();

        let err = logger.open().await.unwrap_err();
        assert!(matches!(err, LoggerError::SinkError { .. }));
        assert!(!logger.is_active());
        assert!(logger.file_sink().is_some_and(|file| !file.is_open()));
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.ends_with("[info] kept\n"));
    }

}
