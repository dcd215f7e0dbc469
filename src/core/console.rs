//! Console-style API over a [`Logger`]
//!
//! Group nesting indents subsequent records by two spaces per level;
//! counters and timers are keyed by label (`"default"` when unnamed).
//! This state belongs to the logger, so every [`Console`] handle of one
//! logger sees the same groups, counters and timers.

use super::formatter::format_args;
use super::log_level::LogLevel;
use super::log_value::{ErrorValue, LogValue};
use super::logger::Logger;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

const INDENT: usize = 2;

pub const DEFAULT_LABEL: &str = "default";

#[derive(Debug, Default)]
pub(crate) struct ConsoleState {
    indent: usize,
    counts: HashMap<String, u64>,
    times: HashMap<String, Instant>,
}

pub struct Console {
    logger: Logger,
    state: Arc<Mutex<ConsoleState>>,
}

impl Console {
    /// Same as [`Logger::console`]
    pub fn new(logger: Logger) -> Self {
        logger.console()
    }

    pub(crate) fn attach(logger: Logger, state: Arc<Mutex<ConsoleState>>) -> Self {
        Self { logger, state }
    }

    /// Current group indentation in spaces
    pub fn indent(&self) -> usize {
        self.state.lock().indent
    }

    fn write(&self, level: LogLevel, args: &[LogValue]) {
        let indent = self.indent();
        self.logger.write(level, indent, args);
    }

    /// Error record when `assertion` is false
    pub fn assert(&self, assertion: bool, args: &[LogValue]) {
        if assertion {
            return;
        }
        let message = if args.is_empty() {
            "Assertion failed".to_string()
        } else {
            format!("Assertion failed: {}", format_args(args))
        };
        self.write(LogLevel::Error, &[LogValue::from(message)]);
    }

    pub fn count(&self, label: &str) {
        let count = {
            let mut state = self.state.lock();
            let count = state.counts.entry(label.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        self.write(LogLevel::Debug, &[LogValue::from(format!("{}: {}", label, count))]);
    }

    pub fn count_reset(&self, label: &str) {
        self.state.lock().counts.remove(label);
    }

    pub fn debug(&self, args: &[LogValue]) {
        self.write(LogLevel::Debug, args);
    }

    pub fn dir(&self, args: &[LogValue]) {
        self.write(LogLevel::Debug, args);
    }

    /// Debug record with the message and the current backtrace
    pub fn trace(&self, args: &[LogValue]) {
        let trace = ErrorValue::capture(format_args(args)).with_name("Trace");
        self.write(LogLevel::Debug, &[LogValue::from(trace)]);
    }

    pub fn info(&self, args: &[LogValue]) {
        self.write(LogLevel::Info, args);
    }

    pub fn log(&self, args: &[LogValue]) {
        self.write(LogLevel::Log, args);
    }

    pub fn warn(&self, args: &[LogValue]) {
        self.write(LogLevel::Warn, args);
    }

    pub fn error(&self, args: &[LogValue]) {
        self.write(LogLevel::Error, args);
    }

    /// Log `args` (if any) and indent what follows
    pub fn group(&self, args: &[LogValue]) {
        if !args.is_empty() {
            self.log(args);
        }
        self.state.lock().indent += INDENT;
    }

    pub fn group_collapsed(&self, args: &[LogValue]) {
        self.group(args);
    }

    pub fn group_end(&self) {
        let mut state = self.state.lock();
        state.indent = state.indent.saturating_sub(INDENT);
    }

    /// Data serialized as one JSON line, never indented
    pub fn table(&self, data: impl Into<LogValue>) {
        let data = data.into();
        let json = serde_json::to_string(&data.to_json_value()).unwrap_or_else(|_| data.to_string());
        self.logger.write(LogLevel::Log, 0, &[LogValue::from(json)]);
    }

    pub fn time(&self, label: &str) {
        self.state
            .lock()
            .times
            .insert(label.to_string(), Instant::now());
    }

    /// Debug record with the elapsed time; the timer is removed
    pub fn time_end(&self, label: &str) {
        let start = self.state.lock().times.remove(label);
        match start {
            Some(start) => {
                let message = elapsed_message(label, start);
                self.write(LogLevel::Debug, &[LogValue::from(message)]);
            }
            None => self.no_such_label(label),
        }
    }

    /// Debug record with the elapsed time followed by `args`
    pub fn time_log(&self, label: &str, args: &[LogValue]) {
        let start = self.state.lock().times.get(label).copied();
        match start {
            Some(start) => {
                let mut line = Vec::with_capacity(args.len() + 1);
                line.push(LogValue::from(elapsed_message(label, start)));
                line.extend_from_slice(args);
                self.write(LogLevel::Debug, &line);
            }
            None => self.no_such_label(label),
        }
    }

    fn no_such_label(&self, label: &str) {
        let message = format!("Warning: No such label '{}'", label);
        self.write(LogLevel::Warn, &[LogValue::from(message)]);
    }
}

fn elapsed_message(label: &str, start: Instant) -> String {
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    format!("{}: {:.3}ms", label, ms)
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("indent", &self.indent())
            .finish()
    }
}
