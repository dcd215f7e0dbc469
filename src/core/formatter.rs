//! Rendering of log records
//!
//! Provides three representations of a record:
//! - Pretty: `HH:MM:SS  <worker>  <tag>  <message>`, optionally colorized
//! - File: `<timestamp> [<level>] <message>` collapsed onto one line
//! - Json: single-line object with `timestamp`, `workerId`, `level`, `message`
//!
//! Rendering never fails. Anything that cannot be serialized degrades to
//! its display text.

use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::log_value::LogValue;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

#[cfg(feature = "console")]
use colored::Colorize;

/// Rendered in place of an empty message
pub const NO_DATA: &str = "no data to log";

/// Stack frame marker removed from error and debug output
const STACK_AT: &str = "  at ";

/// Replaces line breaks so each record stays on one physical line
pub const LINE_SEPARATOR: &str = ";";

const TAG_WIDTH: usize = 6;

const RESERVED_KEYS: [&str; 3] = ["timestamp", "workerId", "level"];

/// Output format for a destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colorized line (stdout default)
    ///
    /// Example: `10:30:45  W1   info    Request processed`
    #[default]
    Pretty,

    /// Line-safe plain text (file default)
    ///
    /// Example: `2025-01-08T10:30:45.123Z [info] Request processed`
    File,

    /// JSON object per line
    ///
    /// Example: `{"level":"info","message":"Request processed","timestamp":"2025-01-08T10:30:45.123Z","workerId":"W1"}`
    Json,
}

#[derive(Debug, Clone)]
pub struct Formatter {
    worker_id: String,
    home: Option<String>,
    colors: bool,
    timestamp_format: TimestampFormat,
}

impl Formatter {
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            home: None,
            colors: true,
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Path prefix stripped from error and debug messages
    #[must_use]
    pub fn with_home(mut self, home: Option<String>) -> Self {
        self.home = home.filter(|h| !h.is_empty());
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Render a record in the requested representation
    pub fn render(&self, format: OutputFormat, record: &LogRecord<'_>) -> String {
        match format {
            OutputFormat::Pretty => self.pretty(record),
            OutputFormat::File => self.file(record),
            OutputFormat::Json => self.json(record),
        }
    }

    /// Message text: arguments joined, indented, stacks normalized for
    /// error and debug records
    pub fn format(&self, level: LogLevel, indent: usize, args: &[LogValue]) -> String {
        format!("{}{}", " ".repeat(indent), self.message(level, args))
    }

    pub fn pretty(&self, record: &LogRecord<'_>) -> String {
        let level = record.level;
        let message = self.format(level, record.indent, record.args);
        let time = TimestampFormat::time_of_day(&record.timestamp);
        let mark = format!(" {:<width$}", level.to_str(), width = TAG_WIDTH);
        format!(
            "{}  {}  {}  {}",
            self.paint_text(level, &time),
            self.paint_text(level, record.worker_id),
            self.paint_tag(level, &mark),
            self.paint_text(level, &message)
        )
    }

    pub fn file(&self, record: &LogRecord<'_>) -> String {
        let message = self.format(record.level, record.indent, record.args);
        format!(
            "{} [{}] {}",
            self.timestamp_format.format(&record.timestamp),
            record.level,
            collapse_lines(&message)
        )
    }

    pub fn json(&self, record: &LogRecord<'_>) -> String {
        let normalize = |stack: &str| self.normalize_stack(stack);
        let mut obj = serde_json::Map::new();
        let rest = record.args.get(1..).unwrap_or_default();

        let message = match record.first() {
            Some(LogValue::Error(err)) => {
                obj.insert("err".to_string(), err.to_json_with(&normalize));
                if rest.is_empty() {
                    err.message.clone()
                } else {
                    self.message(record.level, rest)
                }
            }
            Some(LogValue::Object(fields)) => {
                for (key, value) in fields {
                    obj.insert(key.clone(), value.to_json_with(&normalize));
                }
                match (rest.is_empty(), fields.get("message")) {
                    (true, Some(own)) => own.to_string(),
                    _ => self.message(record.level, rest),
                }
            }
            _ => self.message(record.level, record.args),
        };
        let message = if message.is_empty() {
            NO_DATA.to_string()
        } else {
            message
        };

        for key in RESERVED_KEYS {
            obj.remove(key);
        }
        obj.insert(
            "timestamp".to_string(),
            self.timestamp_format.to_json(&record.timestamp),
        );
        obj.insert(
            "workerId".to_string(),
            serde_json::Value::String(record.worker_id.to_string()),
        );
        obj.insert(
            "level".to_string(),
            serde_json::Value::String(record.level.to_str().to_string()),
        );
        obj.insert("message".to_string(), serde_json::Value::String(message));

        let value = serde_json::Value::Object(obj);
        serde_json::to_string(&value).unwrap_or_else(|_| value.to_string())
    }

    /// Strip frame markers and the home prefix from a stack trace
    pub fn normalize_stack(&self, stack: &str) -> String {
        if stack.is_empty() {
            return NO_DATA.to_string();
        }
        let res = stack.replace(STACK_AT, "");
        match &self.home {
            Some(home) => res.replace(home.as_str(), ""),
            None => res,
        }
    }

    fn message(&self, level: LogLevel, args: &[LogValue]) -> String {
        let text = format_args(args);
        if text.is_empty() {
            return NO_DATA.to_string();
        }
        if level.normalizes_stack() {
            self.normalize_stack(&text)
        } else {
            text
        }
    }

    #[cfg(feature = "console")]
    fn paint_text(&self, level: LogLevel, text: &str) -> String {
        if !self.colors {
            return text.to_string();
        }
        let (fg, bold) = level.text_color();
        let painted = text.color(fg);
        if bold {
            painted.bold().to_string()
        } else {
            painted.to_string()
        }
    }

    #[cfg(feature = "console")]
    fn paint_tag(&self, level: LogLevel, tag: &str) -> String {
        if !self.colors {
            return tag.to_string();
        }
        let (fg, bg) = level.tag_colors();
        tag.color(fg).on_color(bg).bold().to_string()
    }

    #[cfg(not(feature = "console"))]
    fn paint_text(&self, _level: LogLevel, text: &str) -> String {
        text.to_string()
    }

    #[cfg(not(feature = "console"))]
    fn paint_tag(&self, _level: LogLevel, tag: &str) -> String {
        tag.to_string()
    }
}

/// Replace line breaks with [`LINE_SEPARATOR`]
pub fn collapse_lines(text: &str) -> String {
    text.replace("\r\n", LINE_SEPARATOR)
        .replace(['\n', '\r'], LINE_SEPARATOR)
}

/// Join arguments the way `util.format` does: a leading string may carry
/// `%s %d %i %f %j %o %O %%` placeholders; leftovers are space-separated
pub fn format_args(args: &[LogValue]) -> String {
    let mut rest = args.iter();
    let mut parts: Vec<String> = Vec::with_capacity(args.len());

    if let Some(LogValue::String(template)) = args.first() {
        rest.next();
        if template.contains('%') {
            parts.push(substitute(template, &mut rest));
        } else {
            parts.push(template.clone());
        }
    }
    parts.extend(rest.map(ToString::to_string));
    parts.join(" ")
}

fn substitute<'a, I>(template: &str, args: &mut I) -> String
where
    I: Iterator<Item = &'a LogValue>,
{
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(spec @ ('s' | 'd' | 'i' | 'f' | 'j' | 'o' | 'O')) => match args.next() {
                Some(arg) => {
                    chars.next();
                    out.push_str(&placeholder(spec, arg));
                }
                None => out.push('%'),
            },
            _ => out.push('%'),
        }
    }
    out
}

fn placeholder(spec: char, arg: &LogValue) -> String {
    match spec {
        'd' | 'i' | 'f' => number(spec, arg),
        'j' => serde_json::to_string(&arg.to_json_value()).unwrap_or_else(|_| arg.to_string()),
        'o' | 'O' => arg.inspect(),
        _ => arg.to_string(),
    }
}

fn number(spec: char, arg: &LogValue) -> String {
    let value = match arg {
        LogValue::Int(i) => *i as f64,
        LogValue::Float(f) => *f,
        LogValue::Bool(b) => f64::from(u8::from(*b)),
        LogValue::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    };
    if value.is_nan() {
        return "NaN".to_string();
    }
    match spec {
        'f' => value.to_string(),
        'i' => value.trunc().to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_value::ErrorValue;
    use chrono::{DateTime, TimeZone, Utc};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).single().unwrap()
            + chrono::Duration::milliseconds(123)
    }

    fn plain() -> Formatter {
        Formatter::new("W1").with_colors(false)
    }

    #[test]
    fn test_format_joins_and_indents() {
        let args = vec![LogValue::from("Test message"), LogValue::from("arg2")];
        let text = plain().format(LogLevel::Info, 4, &args);
        assert_eq!(text, "    Test message arg2");
    }

    #[test]
    fn test_empty_message_sentinel() {
        let text = plain().format(LogLevel::Info, 0, &[]);
        assert_eq!(text, NO_DATA);
        let text = plain().format(LogLevel::Error, 0, &[LogValue::from("")]);
        assert_eq!(text, NO_DATA);
    }

    #[test]
    fn test_placeholders() {
        let args = vec![
            LogValue::from("%s has %d items (%i%%) %j"),
            LogValue::from("cart"),
            LogValue::from(3),
            LogValue::from(42.7),
            LogValue::object([("a", 1)]),
            LogValue::from("extra"),
        ];
        assert_eq!(format_args(&args), "cart has 3 items (42%) {\"a\":1} extra");
    }

    #[test]
    fn test_placeholder_without_argument_stays_literal() {
        let args = vec![LogValue::from("value: %s")];
        assert_eq!(format_args(&args), "value: %s");
        let args = vec![LogValue::from("%d"), LogValue::from("abc")];
        assert_eq!(format_args(&args), "NaN");
    }

    #[test]
    fn test_non_string_first_argument_is_inspected() {
        let args = vec![LogValue::object([("k", "v")]), LogValue::from("tail")];
        assert_eq!(format_args(&args), "{ k: 'v' } tail");
    }

    #[test]
    fn test_file_line() {
        let args = vec![LogValue::from("line one\nline two")];
        let record = LogRecord::new(LogLevel::Warn, 0, at(), "W1", &args);
        assert_eq!(
            plain().file(&record),
            "2025-01-08T10:30:45.123Z [warn] line one;line two"
        );
    }

    #[test]
    fn test_pretty_line_without_colors() {
        let args = vec![LogValue::from("Request processed")];
        let record = LogRecord::new(LogLevel::Info, 0, at(), "W1", &args);
        assert_eq!(
            plain().pretty(&record),
            "10:30:45  W1   info    Request processed"
        );
    }

    #[test]
    fn test_pretty_content_survives_colors() {
        let args = vec![LogValue::from("colored text")];
        let record = LogRecord::new(LogLevel::Error, 0, at(), "W1", &args);
        let line = Formatter::new("W1").pretty(&record);
        assert!(line.contains("colored text"));
        assert!(line.contains("W1"));
    }

    #[test]
    fn test_error_stack_normalized_and_collapsed() {
        let formatter = plain().with_home(Some("/home/user/app".to_string()));
        let err = ErrorValue::new("boom").with_stack("Error: boom\n  at /home/user/app/x.js:1:1");
        let args = vec![LogValue::from(err)];
        let record = LogRecord::new(LogLevel::Error, 0, at(), "W1", &args);
        let line = formatter.file(&record);

        assert!(!line.contains("/home/user/app"));
        assert!(!line.contains("  at "));
        assert!(!line.contains('\n'));
        assert!(line.ends_with("[error] Error: boom;/x.js:1:1"));
    }

    #[test]
    fn test_info_is_not_normalized() {
        let formatter = plain().with_home(Some("/srv".to_string()));
        let text = formatter.format(LogLevel::Info, 0, &[LogValue::from("/srv/a  at b")]);
        assert_eq!(text, "/srv/a  at b");
    }

    #[test]
    fn test_normalize_stack_keeps_frames() {
        let formatter = plain().with_home(Some("/test/home".to_string()));
        let stack = "Error: Test\n  at /test/home/file.js:1:1\n  at /other/path/file.js:2:2";
        let normalized = formatter.normalize_stack(stack);
        assert!(!normalized.contains("/test/home"));
        assert!(normalized.contains("file.js:1:1"));
        assert!(normalized.contains("/other/path/file.js:2:2"));
        assert_eq!(formatter.normalize_stack(""), NO_DATA);
    }

    #[test]
    fn test_json_spreads_object_and_uses_rest_as_message() {
        let args = vec![LogValue::object([("custom", 1)]), LogValue::from("hello")];
        let record = LogRecord::new(LogLevel::Info, 0, at(), "W1", &args);
        let parsed: serde_json::Value = serde_json::from_str(&plain().json(&record)).unwrap();

        assert_eq!(parsed["custom"], 1);
        assert_eq!(parsed["message"], "hello");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["workerId"], "W1");
        assert_eq!(parsed["timestamp"], "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_json_reserved_keys_cannot_be_overridden() {
        let args = vec![LogValue::object([
            ("level", LogValue::from("fake")),
            ("message", LogValue::from("own message")),
        ])];
        let record = LogRecord::new(LogLevel::Warn, 0, at(), "W1", &args);
        let parsed: serde_json::Value = serde_json::from_str(&plain().json(&record)).unwrap();
        assert_eq!(parsed["level"], "warn");
        assert_eq!(parsed["message"], "own message");
    }

    #[test]
    fn test_json_error_first_argument() {
        let formatter = plain().with_home(Some("/app".to_string()));
        let err = ErrorValue::new("JSON error test").with_stack("Error: JSON error test\n  at /app/x.js:1:1");
        let args = vec![LogValue::from(err)];
        let record = LogRecord::new(LogLevel::Error, 0, at(), "W1", &args);
        let parsed: serde_json::Value = serde_json::from_str(&formatter.json(&record)).unwrap();

        assert_eq!(parsed["err"]["message"], "JSON error test");
        assert_eq!(parsed["err"]["stack"], "Error: JSON error test\n/x.js:1:1");
        assert!(parsed.get("error").is_none());
        assert_eq!(parsed["message"], "JSON error test");
    }

    #[test]
    fn test_json_nested_error_fields_expanded() {
        let err = ErrorValue::new("inner").with_stack("Error: inner\n  at y");
        let args = vec![LogValue::object([("err", LogValue::from(err)), ("id", LogValue::from(7))])];
        let record = LogRecord::new(LogLevel::Debug, 0, at(), "W1", &args);
        let parsed: serde_json::Value = serde_json::from_str(&plain().json(&record)).unwrap();

        assert_eq!(parsed["err"]["message"], "inner");
        assert_eq!(parsed["err"]["stack"], "Error: inner\ny");
        assert_eq!(parsed["id"], 7);
        assert_eq!(parsed["message"], NO_DATA);
    }

    #[test]
    fn test_json_plain_message() {
        let args = vec![LogValue::from("Test JSON message")];
        let record = LogRecord::new(LogLevel::Error, 2, at(), "W2", &args);
        let line = plain().json(&record);
        assert!(!line.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], "Test JSON message");
        assert_eq!(parsed["workerId"], "W2");
    }

    #[test]
    fn test_render_dispatch() {
        let args = vec![LogValue::from("x")];
        let record = LogRecord::new(LogLevel::Log, 0, at(), "W1", &args);
        let formatter = plain();
        assert_eq!(formatter.render(OutputFormat::File, &record), formatter.file(&record));
        assert_eq!(formatter.render(OutputFormat::Json, &record), formatter.json(&record));
        assert_eq!(formatter.render(OutputFormat::Pretty, &record), formatter.pretty(&record));
    }

    #[test]
    fn test_collapse_lines() {
        assert_eq!(collapse_lines("a\r\nb\nc\rd"), "a;b;c;d");
    }
}
