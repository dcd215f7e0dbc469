//! Buffered stream writer with a single in-flight flush
//!
//! `write` only appends to an in-memory chunk list. Bytes reach the stream
//! on one of four paths, all of which go through the same flush lock:
//! - the buffer crosses `write_buffer` (flush spawned on the runtime)
//! - the periodic timer fires (every `flush_interval`)
//! - an explicit `flush()` / `close()`
//! - a stream swap (`replace_stream`, used by the daily rollover)
//!
//! While a flush holds the lock, further flush requests queue behind it and
//! are resolved in FIFO order once the lock is released.
//!
//! A stream lost to a failed swap is reopened through the [`Reopen`] hook by
//! the next flush or by `close`; until then records stay buffered.

use crate::core::config::{DEFAULT_FLUSH_INTERVAL, DEFAULT_WRITE_BUFFER};
use crate::core::{EventBus, LogStream, LoggerError, LoggerMetrics, Result};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const INTERRUPTED: &str = "flush interrupted before completion";

type Waiter = oneshot::Sender<std::result::Result<(), String>>;

pub type ReopenFuture = Pin<Box<dyn Future<Output = Result<(String, LogStream)>> + Send>>;

/// Opens a replacement stream and returns it with its label
pub type Reopen = Arc<dyn Fn() -> ReopenFuture + Send + Sync>;

/// Buffer thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferOptions {
    /// Buffered byte count that triggers a flush
    pub write_buffer: usize,
    /// Period of the background flush; zero disables it
    pub flush_interval: Duration,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            write_buffer: DEFAULT_WRITE_BUFFER,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

#[derive(Default)]
struct State {
    chunks: Vec<Vec<u8>>,
    buffered: usize,
    active: bool,
    /// `Some` while the flush lock is held; holds the queued callers
    flushing: Option<Vec<Waiter>>,
    flush_scheduled: bool,
    ticker: Option<JoinHandle<()>>,
}

struct Inner {
    label: RwLock<String>,
    options: BufferOptions,
    state: Mutex<State>,
    stream: tokio::sync::Mutex<Option<LogStream>>,
    reopen: RwLock<Option<Reopen>>,
    runtime: Handle,
    events: EventBus,
    metrics: Arc<LoggerMetrics>,
}

/// Buffered writer over a [`LogStream`]; cheap to clone
///
/// # Example
///
/// ```no_run
/// use rust_buffered_logger::core::{EventBus, LoggerMetrics};
/// use rust_buffered_logger::sinks::{BufferOptions, BufferedSink};
/// use std::sync::Arc;
///
/// # async fn example() -> rust_buffered_logger::Result<()> {
/// let file = tokio::fs::File::create("app.log").await?;
/// let sink = BufferedSink::start(
///     "app.log",
///     Box::new(file),
///     BufferOptions::default(),
///     EventBus::new(),
///     Arc::new(LoggerMetrics::new()),
/// )?;
///
/// sink.write(b"hello\n".to_vec())?;
/// sink.flush().await?;
/// sink.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BufferedSink {
    inner: Arc<Inner>,
}

impl BufferedSink {
    /// Start buffering into `stream`
    ///
    /// Must be called from within a tokio runtime; background flushes are
    /// spawned on it.
    pub fn start(
        label: impl Into<String>,
        stream: LogStream,
        options: BufferOptions,
        events: EventBus,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| {
            LoggerError::config("BufferedSink", "must be started inside a tokio runtime")
        })?;

        let inner = Arc::new(Inner {
            label: RwLock::new(label.into()),
            options,
            state: Mutex::new(State {
                active: true,
                ..State::default()
            }),
            stream: tokio::sync::Mutex::new(Some(stream)),
            reopen: RwLock::new(None),
            runtime,
            events,
            metrics,
        });

        if !options.flush_interval.is_zero() {
            let ticker = spawn_ticker(&inner);
            inner.state.lock().ticker = Some(ticker);
        }

        Ok(Self { inner })
    }

    /// Name used in error messages, normally the file path
    pub fn label(&self) -> String {
        self.inner.label.read().clone()
    }

    pub fn options(&self) -> BufferOptions {
        self.inner.options
    }

    /// Install the hook used when the stream was lost to a failed swap
    pub fn set_reopen(&self, reopen: Reopen) {
        *self.inner.reopen.write() = Some(reopen);
    }

    /// Whether a stream is attached
    pub async fn has_stream(&self) -> bool {
        self.inner.stream.lock().await.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    pub fn buffered_bytes(&self) -> usize {
        self.inner.state.lock().buffered
    }

    pub fn pending_chunks(&self) -> usize {
        self.inner.state.lock().chunks.len()
    }

    /// Whether a flush currently holds the lock
    pub fn is_flushing(&self) -> bool {
        self.inner.state.lock().flushing.is_some()
    }

    /// Queue bytes; never blocks on I/O
    pub fn write(&self, bytes: Vec<u8>) -> Result<()> {
        let schedule = {
            let mut state = self.inner.state.lock();
            if !state.active {
                return Err(LoggerError::not_open(self.label()));
            }
            state.buffered += bytes.len();
            state.chunks.push(bytes);
            claim_threshold_flush(&mut state, &self.inner.options)
        };

        if schedule {
            spawn_flush(self.inner.clone());
        }
        Ok(())
    }

    /// Write all buffered bytes to the stream
    ///
    /// If another flush is running, waits for it instead of starting a
    /// second one and reports its outcome.
    pub async fn flush(&self) -> Result<()> {
        enum Step {
            Wait(oneshot::Receiver<std::result::Result<(), String>>),
            Closed,
            Empty,
            Write(Vec<u8>),
        }

        let step = {
            let mut state = self.inner.state.lock();
            if let Some(waiters) = state.flushing.as_mut() {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Step::Wait(rx)
            } else if !state.active {
                Step::Closed
            } else if state.chunks.is_empty() {
                Step::Empty
            } else {
                state.flushing = Some(Vec::new());
                state.buffered = 0;
                Step::Write(std::mem::take(&mut state.chunks).concat())
            }
        };

        match step {
            Step::Wait(rx) => match rx.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(message)) => Err(LoggerError::flush_failed(self.label(), message)),
                Err(_) => Err(LoggerError::flush_failed(self.label(), INTERRUPTED)),
            },
            Step::Closed => Err(LoggerError::not_open(self.label())),
            Step::Empty => Ok(()),
            Step::Write(data) => {
                let mut guard = FlushGuard::new(self.inner.clone());
                guard.pending = Some(data);
                self.write_out(&mut guard).await
            }
        }
    }

    /// Drain into the current stream, shut it down and continue on the
    /// stream returned by `reopen`
    ///
    /// Holds the flush lock for the whole swap; records written meanwhile
    /// stay buffered and land in the new stream.
    pub async fn replace_stream<F, Fut>(&self, label: impl Into<String>, reopen: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LogStream>>,
    {
        let mut guard = self.acquire().await;

        let taken = {
            let mut state = self.inner.state.lock();
            if state.active {
                state.buffered = 0;
                Some(std::mem::take(&mut state.chunks).concat())
            } else {
                None
            }
        };
        let Some(data) = taken else {
            guard.outcome = Some(Ok(()));
            return Err(LoggerError::not_open(self.label()));
        };

        let mut slot = self.inner.stream.lock().await;
        match slot.take() {
            Some(mut old) => match drain_and_shutdown(&mut old, &data).await {
                Ok(()) => {
                    if !data.is_empty() {
                        self.inner.metrics.record_flush(data.len());
                    }
                }
                Err(e) => {
                    self.inner
                        .events
                        .emit_error(LoggerError::flush_failed(self.label(), e.to_string()));
                    guard.pending = Some(data);
                }
            },
            None => guard.pending = Some(data),
        }

        match reopen().await {
            Ok(stream) => {
                *slot = Some(stream);
                *self.inner.label.write() = label.into();
                guard.outcome = Some(Ok(()));
                Ok(())
            }
            Err(e) => {
                guard.outcome = Some(Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// Stop the timer, write what is left and shut the stream down
    ///
    /// Idempotent: closing a closed sink succeeds without touching the stream.
    ///
    /// Without a stream to drain into, the sink stays open with its records
    /// buffered and the error is returned; a later `close` retries.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.acquire().await;
        if !self.is_active() {
            guard.outcome = Some(Ok(()));
            return Ok(());
        }

        let mut slot = self.inner.stream.lock().await;
        let stream = match self.attached_stream(&mut slot).await {
            Ok(stream) => stream,
            Err(e) => {
                self.inner.metrics.record_flush_failure();
                guard.outcome = Some(Err(e.to_string()));
                return Err(LoggerError::flush_failed(self.label(), e.to_string()));
            }
        };

        let (data, ticker) = {
            let mut state = self.inner.state.lock();
            state.active = false;
            state.buffered = 0;
            (std::mem::take(&mut state.chunks).concat(), state.ticker.take())
        };
        if let Some(ticker) = ticker {
            ticker.abort();
        }

        let drained = drain_and_shutdown(stream, &data).await;
        *slot = None;
        match drained {
            Ok(()) => {
                if !data.is_empty() {
                    self.inner.metrics.record_flush(data.len());
                }
                guard.outcome = Some(Ok(()));
                Ok(())
            }
            Err(e) => {
                self.inner.metrics.record_flush_failure();
                guard.outcome = Some(Err(e.to_string()));
                Err(LoggerError::flush_failed(self.label(), e.to_string()))
            }
        }
    }

    /// Take the flush lock, waiting for any flush in flight
    async fn acquire(&self) -> FlushGuard {
        loop {
            let rx = {
                let mut state = self.inner.state.lock();
                match state.flushing.as_mut() {
                    Some(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        Some(rx)
                    }
                    None => {
                        state.flushing = Some(Vec::new());
                        None
                    }
                }
            };
            match rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => return FlushGuard::new(self.inner.clone()),
            }
        }
    }

    /// The stream in `slot`, reopened through the hook when it is missing
    async fn attached_stream<'a>(
        &self,
        slot: &'a mut Option<LogStream>,
    ) -> io::Result<&'a mut LogStream> {
        if slot.is_none() {
            let reopen = self.inner.reopen.read().clone();
            let Some(reopen) = reopen else {
                return Err(stream_missing("no reopen hook"));
            };
            let (label, stream) = reopen()
                .await
                .map_err(|e| stream_missing(&e.to_string()))?;
            *self.inner.label.write() = label;
            *slot = Some(stream);
        }
        slot.as_mut()
            .ok_or_else(|| stream_missing("reopen returned no stream"))
    }

    async fn write_out(&self, guard: &mut FlushGuard) -> Result<()> {
        let result = {
            let data = guard.pending.as_deref().unwrap_or_default();
            let mut slot = self.inner.stream.lock().await;
            match self.attached_stream(&mut slot).await {
                Ok(stream) => match stream.write_all(data).await {
                    Ok(()) => stream.flush().await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            }
        };

        match result {
            Ok(()) => {
                let written = guard.pending.take().map_or(0, |data| data.len());
                self.inner.metrics.record_flush(written);
                guard.outcome = Some(Ok(()));
                Ok(())
            }
            Err(e) => {
                // pending stays set and is put back in front by the guard
                self.inner.metrics.record_flush_failure();
                guard.outcome = Some(Err(e.to_string()));
                Err(LoggerError::flush_failed(self.label(), e.to_string()))
            }
        }
    }

    async fn flush_in_background(&self) {
        if let Err(e) = self.flush().await {
            if !e.is_not_open() {
                self.inner.events.emit_error(e);
            }
        }
    }
}

impl fmt::Debug for BufferedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BufferedSink")
            .field("label", &*self.inner.label.read())
            .field("options", &self.inner.options)
            .field("active", &state.active)
            .field("buffered", &state.buffered)
            .field("flushing", &state.flushing.is_some())
            .finish()
    }
}

/// Holder of the flush lock
///
/// Dropping it releases the lock, puts `pending` back in front of the
/// buffer and resolves queued callers with `outcome`.
struct FlushGuard {
    inner: Arc<Inner>,
    pending: Option<Vec<u8>>,
    outcome: Option<std::result::Result<(), String>>,
}

impl FlushGuard {
    fn new(inner: Arc<Inner>) -> Self {
        Self {
            inner,
            pending: None,
            outcome: None,
        }
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err(INTERRUPTED.to_string()));

        let (waiters, follow_up) = {
            let mut state = self.inner.state.lock();
            if let Some(data) = self.pending.take().filter(|d| !d.is_empty()) {
                state.buffered += data.len();
                state.chunks.insert(0, data);
            }
            let waiters = state.flushing.take().unwrap_or_default();
            // records that crossed the threshold while the lock was held;
            // after a failure they wait for the next write or tick
            let follow_up = outcome.is_ok()
                && state.active
                && claim_threshold_flush(&mut state, &self.inner.options);
            (waiters, follow_up)
        };

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        if follow_up {
            spawn_flush(self.inner.clone());
        }
    }
}

/// Mark a threshold flush as scheduled if one is due and none is pending
fn claim_threshold_flush(state: &mut State, options: &BufferOptions) -> bool {
    let over = state.buffered >= options.write_buffer;
    if over && state.flushing.is_none() && !state.flush_scheduled {
        state.flush_scheduled = true;
        true
    } else {
        false
    }
}

fn spawn_flush(inner: Arc<Inner>) {
    let runtime = inner.runtime.clone();
    runtime.spawn(async move {
        inner.state.lock().flush_scheduled = false;
        BufferedSink { inner }.flush_in_background().await;
    });
}

fn stream_missing(reason: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotConnected,
        format!("stream is not available: {}", reason),
    )
}

async fn drain_and_shutdown(stream: &mut LogStream, data: &[u8]) -> io::Result<()> {
    if !data.is_empty() {
        stream.write_all(data).await?;
    }
    stream.flush().await?;
    stream.shutdown().await
}

fn spawn_ticker(inner: &Arc<Inner>) -> JoinHandle<()> {
    let weak: Weak<Inner> = Arc::downgrade(inner);
    let period = inner.options.flush_interval;

    inner.runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };
            BufferedSink { inner }.flush_in_background().await;
        }
    })
}
