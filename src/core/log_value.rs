//! Argument values accepted by the write path
//!
//! This module provides:
//! - `LogValue`: one positional argument of a write call
//! - `ErrorValue`: an error with message, optional stack and extra fields
//!
//! Values render two ways: as display text (top-level strings raw) for the
//! pretty and file lines, and as `serde_json::Value` for JSON lines.

use std::collections::BTreeMap;
use std::fmt;

/// Ordered key-value fields of an object argument
pub type Fields = BTreeMap<String, LogValue>;

/// Value type for write-call arguments
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<LogValue>),
    Object(Fields),
    Error(ErrorValue),
}

impl LogValue {
    /// Build an object value from key-value pairs
    pub fn object<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<LogValue>,
    {
        LogValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an error value from any `std::error::Error`
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        LogValue::Error(ErrorValue::from_error(err))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LogValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, LogValue::Object(_))
    }

    /// Nested representation: strings are quoted, containers are expanded
    #[must_use]
    pub fn inspect(&self) -> String {
        match self {
            LogValue::String(s) => format!("'{}'", s),
            LogValue::Array(items) if items.is_empty() => "[]".to_string(),
            LogValue::Array(items) => {
                let inner: Vec<String> = items.iter().map(LogValue::inspect).collect();
                format!("[ {} ]", inner.join(", "))
            }
            LogValue::Object(fields) if fields.is_empty() => "{}".to_string(),
            LogValue::Object(fields) => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.inspect()))
                    .collect();
                format!("{{ {} }}", inner.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Convert to `serde_json::Value`, passing error stacks through `stack`
    pub fn to_json_with<F>(&self, stack: &F) -> serde_json::Value
    where
        F: Fn(&str) -> String,
    {
        match self {
            LogValue::Null => serde_json::Value::Null,
            LogValue::Bool(b) => serde_json::Value::Bool(*b),
            LogValue::Int(i) => serde_json::Value::Number((*i).into()),
            LogValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            LogValue::String(s) => serde_json::Value::String(s.clone()),
            LogValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json_with(stack)).collect())
            }
            LogValue::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_with(stack)))
                    .collect(),
            ),
            LogValue::Error(err) => err.to_json_with(stack),
        }
    }

    /// Convert to `serde_json::Value` with stacks untouched
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        self.to_json_with(&|s: &str| s.to_string())
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Null => write!(f, "null"),
            LogValue::Bool(b) => write!(f, "{}", b),
            LogValue::Int(i) => write!(f, "{}", i),
            LogValue::Float(fl) => write!(f, "{}", fl),
            LogValue::String(s) => write!(f, "{}", s),
            LogValue::Error(err) => write!(f, "{}", err.stack_or_headline()),
            LogValue::Array(_) | LogValue::Object(_) => write!(f, "{}", self.inspect()),
        }
    }
}

/// An error argument
///
/// # Example
///
/// ```
/// use rust_buffered_logger::core::{ErrorValue, LogValue};
///
/// let err = ErrorValue::new("boom").with_stack("Error: boom\n    at handler (src/app.rs:10:5)");
/// let value = LogValue::from(err);
/// assert!(value.to_string().starts_with("Error: boom"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
    pub fields: Fields,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            message: message.into(),
            stack: None,
            fields: Fields::new(),
        }
    }

    /// Capture the message together with the current backtrace
    pub fn capture(message: impl Into<String>) -> Self {
        let err = Self::new(message);
        let trace = std::backtrace::Backtrace::force_capture().to_string();
        let stack = format!("{}\n{}", err.headline(), trace.trim_end());
        err.with_stack(stack)
    }

    /// Build from a `std::error::Error`; the source chain becomes the stack
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut value = Self::new(err.to_string());
        let mut lines = vec![value.headline()];
        let mut source = err.source();
        while let Some(cause) = source {
            lines.push(format!("    caused by: {}", cause));
            source = cause.source();
        }
        if lines.len() > 1 {
            value.stack = Some(lines.join("\n"));
        }
        value
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<LogValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// `Name: message`
    #[must_use]
    pub fn headline(&self) -> String {
        if self.message.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.name, self.message)
        }
    }

    #[must_use]
    pub fn stack_or_headline(&self) -> String {
        self.stack.clone().unwrap_or_else(|| self.headline())
    }

    /// `{ ...fields, name, message, stack }`
    pub fn to_json_with<F>(&self, stack: &F) -> serde_json::Value
    where
        F: Fn(&str) -> String,
    {
        let mut obj: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_with(stack)))
            .collect();
        obj.insert("name".to_string(), self.name.clone().into());
        obj.insert("message".to_string(), self.message.clone().into());
        obj.insert(
            "stack".to_string(),
            stack(&self.stack_or_headline()).into(),
        );
        serde_json::Value::Object(obj)
    }
}

impl From<ErrorValue> for LogValue {
    fn from(err: ErrorValue) -> Self {
        LogValue::Error(err)
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::String(s)
    }
}

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::String(s.to_string())
    }
}

impl From<&String> for LogValue {
    fn from(s: &String) -> Self {
        LogValue::String(s.clone())
    }
}

impl From<i64> for LogValue {
    fn from(i: i64) -> Self {
        LogValue::Int(i)
    }
}

impl From<i32> for LogValue {
    fn from(i: i32) -> Self {
        LogValue::Int(i64::from(i))
    }
}

impl From<u32> for LogValue {
    fn from(i: u32) -> Self {
        LogValue::Int(i64::from(i))
    }
}

impl From<u64> for LogValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(LogValue::Int)
            .unwrap_or(LogValue::Float(i as f64))
    }
}

impl From<usize> for LogValue {
    fn from(i: usize) -> Self {
        LogValue::from(i as u64)
    }
}

impl From<f64> for LogValue {
    fn from(f: f64) -> Self {
        LogValue::Float(f)
    }
}

impl From<f32> for LogValue {
    fn from(f: f32) -> Self {
        LogValue::Float(f64::from(f))
    }
}

impl From<bool> for LogValue {
    fn from(b: bool) -> Self {
        LogValue::Bool(b)
    }
}

impl<T: Into<LogValue>> From<Option<T>> for LogValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(LogValue::Null)
    }
}

impl<T: Into<LogValue>> From<Vec<T>> for LogValue {
    fn from(items: Vec<T>) -> Self {
        LogValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => LogValue::Null,
            serde_json::Value::Bool(b) => LogValue::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(LogValue::Int)
                .or_else(|| n.as_f64().map(LogValue::Float))
                .unwrap_or(LogValue::Null),
            serde_json::Value::String(s) => LogValue::String(s),
            serde_json::Value::Array(items) => {
                LogValue::Array(items.into_iter().map(LogValue::from).collect())
            }
            serde_json::Value::Object(map) => {
                LogValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
