//! Daily log file sink
//!
//! Combines a [`BufferedSink`] with a [`RotationManager`]: records go to
//! `<dir>/<YYYY-MM-DD>-<workerId>.log`, the file is swapped at UTC midnight
//! and expired files of the same worker are removed on open and on rollover.
//!
//! When the new day's file cannot be opened, records stay buffered and the
//! next flush retries the open.

use super::buffered::{BufferOptions, BufferedSink, Reopen, ReopenFuture};
use super::rotation::RotationManager;
use crate::core::{
    Clock, EventBus, Formatter, LogRecord, LoggerError, LoggerEvent, LoggerMetrics, OutputFormat,
    Result, Sink, StreamFactory,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct FileSinkOptions {
    pub dir: PathBuf,
    pub worker_id: String,
    pub keep_days: u32,
    pub buffer: BufferOptions,
    /// `File` or `Json`
    pub format: OutputFormat,
}

#[derive(Default)]
struct FileState {
    buffered: Option<BufferedSink>,
    path: Option<PathBuf>,
    rollover: Option<JoinHandle<()>>,
}

struct Inner {
    rotation: RotationManager,
    buffer: BufferOptions,
    format: OutputFormat,
    formatter: Arc<Formatter>,
    factory: Arc<dyn StreamFactory>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    metrics: Arc<LoggerMetrics>,
    state: Mutex<FileState>,
    /// Serializes open, close and rollover
    lifecycle: tokio::sync::Mutex<()>,
}

#[derive(Clone)]
pub struct FileSink {
    inner: Arc<Inner>,
}

impl FileSink {
    pub fn new(
        options: FileSinkOptions,
        formatter: Arc<Formatter>,
        factory: Arc<dyn StreamFactory>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        metrics: Arc<LoggerMetrics>,
    ) -> Self {
        let format = match options.format {
            OutputFormat::Json => OutputFormat::Json,
            _ => OutputFormat::File,
        };
        Self {
            inner: Arc::new(Inner {
                rotation: RotationManager::new(options.dir, options.worker_id, options.keep_days),
                buffer: options.buffer,
                format,
                formatter,
                factory,
                clock,
                events,
                metrics,
                state: Mutex::new(FileState::default()),
                lifecycle: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn rotation(&self) -> &RotationManager {
        &self.inner.rotation
    }

    /// File currently written to, if open
    pub fn current_path(&self) -> Option<PathBuf> {
        self.inner.state.lock().path.clone()
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.lock().buffered.is_some()
    }

    pub fn buffered(&self) -> Option<BufferedSink> {
        self.inner.state.lock().buffered.clone()
    }

    /// Run retention now and report removed files through metrics and
    /// failures through events
    pub async fn cleanup(&self) -> Vec<PathBuf> {
        cleanup(&self.inner).await
    }

    /// Switch to the file for the current date
    ///
    /// The old file is drained and shut down before the new one opens.
    /// Writes made meanwhile land in the new file. No-op when the date has
    /// not changed or the sink is closed. If the new file cannot be opened
    /// the error is returned and the next flush tries again.
    pub async fn rollover(&self) -> Result<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;

        let current = {
            let state = self.inner.state.lock();
            state.buffered.clone().zip(state.path.clone())
        };
        let Some((buffered, old_path)) = current else {
            return Ok(());
        };

        let new_path = self.inner.rotation.current_file(self.inner.clock.now());
        if new_path == old_path {
            return Ok(());
        }

        let inner = self.inner.clone();
        let next = new_path.clone();
        buffered
            .replace_stream(new_path.display().to_string(), || async move {
                remove_if_empty(&inner, &old_path).await;
                cleanup(&inner).await;
                open_stream(&inner, &next).await
            })
            .await?;

        self.inner.state.lock().path = Some(new_path.clone());
        self.inner.metrics.record_rotation();
        self.inner.events.emit(LoggerEvent::Rotate { path: new_path });
        Ok(())
    }

    fn target(&self) -> String {
        match self.current_path() {
            Some(path) => path.display().to_string(),
            None => self.inner.rotation.dir().display().to_string(),
        }
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write(&self, record: &LogRecord<'_>) -> Result<()> {
        let buffered = self.inner.state.lock().buffered.clone();
        let Some(buffered) = buffered else {
            return Err(LoggerError::not_open(self.target()));
        };
        let mut line = self.inner.formatter.render(self.inner.format, record);
        line.push('\n');
        buffered.write(line.into_bytes())
    }

    async fn open(&self) -> Result<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.is_open() {
            return Ok(());
        }

        let dir = self.inner.rotation.dir();
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            LoggerError::io_operation(
                "creating log directory",
                format!("Can not create directory: {}", dir.display()),
                e,
            )
        })?;

        let path = self.inner.rotation.current_file(self.inner.clock.now());
        cleanup(&self.inner).await;
        let stream = open_stream(&self.inner, &path).await?;
        let buffered = BufferedSink::start(
            path.display().to_string(),
            stream,
            self.inner.buffer,
            self.inner.events.clone(),
            self.inner.metrics.clone(),
        )?;

        buffered.set_reopen(reopen_current(Arc::downgrade(&self.inner)));
        let rollover = spawn_rollover(Arc::downgrade(&self.inner));
        let mut state = self.inner.state.lock();
        state.buffered = Some(buffered);
        state.path = Some(path);
        state.rollover = Some(rollover);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        match self.buffered() {
            Some(buffered) => buffered.flush().await,
            None => Err(LoggerError::not_open(self.target())),
        }
    }

    /// Drain and release the file
    ///
    /// If nothing could be drained the sink stays open and the error is
    /// returned, so a later `close` can retry.
    async fn close(&self) -> Result<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;

        let Some(buffered) = self.buffered() else {
            return Ok(());
        };
        let result = buffered.close().await;
        if buffered.is_active() {
            return result;
        }

        let path = {
            let mut state = self.inner.state.lock();
            if let Some(rollover) = state.rollover.take() {
                rollover.abort();
            }
            state.buffered = None;
            state.path.take()
        };
        if let Some(path) = path {
            remove_if_empty(&self.inner, &path).await;
        }
        result
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("rotation", &self.inner.rotation)
            .field("format", &self.inner.format)
            .field("path", &self.current_path())
            .finish()
    }
}

async fn open_stream(inner: &Inner, path: &Path) -> Result<crate::core::LogStream> {
    inner.factory.create(path).await.map_err(|e| {
        LoggerError::io_operation(
            "opening log file",
            format!("Can't open log file: {}", path.display()),
            e,
        )
    })
}

async fn cleanup(inner: &Inner) -> Vec<PathBuf> {
    let report = inner.rotation.cleanup(inner.clock.now()).await;
    inner.metrics.record_files_removed(report.removed.len());
    for err in report.errors {
        inner.events.emit_error(err);
    }
    report.removed
}

/// Files that never received a record are not kept
async fn remove_if_empty(inner: &Inner, path: &Path) {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() == 0 => {
            if let Err(e) = tokio::fs::remove_file(path).await {
                inner.events.emit_error(LoggerError::io_operation(
                    "removing empty log file",
                    path.display().to_string(),
                    e,
                ));
            }
        }
        _ => {}
    }
}

/// Hook that reopens the file of the current date after a failed swap
fn reopen_current(weak: Weak<Inner>) -> Reopen {
    Arc::new(move || -> ReopenFuture {
        let weak = weak.clone();
        Box::pin(async move {
            let inner = weak
                .upgrade()
                .ok_or_else(|| LoggerError::not_open("file sink"))?;
            let path = inner.rotation.current_file(inner.clock.now());
            let stream = open_stream(&inner, &path).await?;

            let previous = inner.state.lock().path.replace(path.clone());
            if previous.as_ref() != Some(&path) {
                inner.metrics.record_rotation();
                inner.events.emit(LoggerEvent::Rotate { path: path.clone() });
            }
            Ok((path.display().to_string(), stream))
        })
    })
}

fn spawn_rollover(weak: Weak<Inner>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let delay = match weak.upgrade() {
                Some(inner) => RotationManager::until_next_midnight(inner.clock.now()),
                None => break,
            };
            tokio::time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                break;
            };
            let events = inner.events.clone();
            if let Err(e) = (FileSink { inner }).rollover().await {
                events.emit_error(e);
            }
        }
    })
}
