//! Lifecycle and error notifications
//!
//! Observers either subscribe to a channel (`crossbeam_channel` receiver)
//! or register a callback. Errors with no observer at all are printed to
//! stderr so they are never silently lost.

use super::error::LoggerError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Notification emitted by a logger or one of its sinks
#[derive(Debug, Clone)]
pub enum LoggerEvent {
    /// Logger finished opening
    Open,
    /// Logger finished closing
    Close,
    /// Output switched to a new day file
    Rotate { path: PathBuf },
    /// Failure on a path that does not return errors to the caller
    Error(Arc<LoggerError>),
}

impl LoggerEvent {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, LoggerEvent::Error(_))
    }
}

impl fmt::Display for LoggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerEvent::Open => write!(f, "open"),
            LoggerEvent::Close => write!(f, "close"),
            LoggerEvent::Rotate { path } => write!(f, "rotate: {}", path.display()),
            LoggerEvent::Error(err) => write!(f, "error: {}", err),
        }
    }
}

pub type EventListener = Arc<dyn Fn(&LoggerEvent) + Send + Sync>;

#[derive(Default)]
struct Observers {
    subscribers: Vec<Sender<LoggerEvent>>,
    listeners: Vec<EventListener>,
}

/// Fan-out of [`LoggerEvent`]s; cheap to clone
#[derive(Clone, Default)]
pub struct EventBus {
    observers: Arc<RwLock<Observers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// New unbounded receiver of every subsequent event
    pub fn subscribe(&self) -> Receiver<LoggerEvent> {
        let (tx, rx) = unbounded();
        self.observers.write().subscribers.push(tx);
        rx
    }

    /// Register a callback invoked synchronously on every event
    pub fn on<F>(&self, listener: F)
    where
        F: Fn(&LoggerEvent) + Send + Sync + 'static,
    {
        self.observers.write().listeners.push(Arc::new(listener));
    }

    pub fn has_observers(&self) -> bool {
        let observers = self.observers.read();
        !observers.subscribers.is_empty() || !observers.listeners.is_empty()
    }

    pub fn emit(&self, event: LoggerEvent) {
        // listeners run outside the lock so they may subscribe or emit
        let (listeners, delivered) = {
            let mut observers = self.observers.write();
            observers
                .subscribers
                .retain(|tx| tx.send(event.clone()).is_ok());
            let delivered = !observers.subscribers.is_empty() || !observers.listeners.is_empty();
            (observers.listeners.clone(), delivered)
        };

        for listener in &listeners {
            listener(&event);
        }

        if !delivered {
            if let LoggerEvent::Error(err) = &event {
                eprintln!("[LOGGER ERROR] {}", err);
            }
        }
    }

    pub fn emit_error(&self, err: LoggerError) {
        self.emit(LoggerEvent::Error(Arc::new(err)));
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observers = self.observers.read();
        f.debug_struct("EventBus")
            .field("subscribers", &observers.subscribers.len())
            .field("listeners", &observers.listeners.len())
            .finish()
    }
}
