//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record level, mirroring the console method that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Log = 0,
    Info = 1,
    Warn = 2,
    Debug = 3,
    Error = 4,
}

impl LogLevel {
    /// Every level, in routing-table order
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Log,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Debug,
        LogLevel::Error,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Log => "log",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Debug => "debug",
            LogLevel::Error => "error",
        }
    }

    /// Position in [`LogLevel::ALL`]
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Levels whose messages carry stack traces worth normalizing
    #[inline]
    pub fn normalizes_stack(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Debug)
    }

    /// Foreground and background of the level tag in pretty output
    #[cfg(feature = "console")]
    pub fn tag_colors(&self) -> (colored::Color, colored::Color) {
        use colored::Color::*;
        match self {
            LogLevel::Log => (Black, White),
            LogLevel::Info => (White, Blue),
            LogLevel::Warn => (Black, Yellow),
            LogLevel::Debug => (White, Green),
            LogLevel::Error => (Yellow, Red),
        }
    }

    /// Foreground of the message text in pretty output, and whether it is bold
    #[cfg(feature = "console")]
    pub fn text_color(&self) -> (colored::Color, bool) {
        use colored::Color::*;
        match self {
            LogLevel::Log => (White, false),
            LogLevel::Info => (White, false),
            LogLevel::Warn => (Yellow, true),
            LogLevel::Debug => (Green, true),
            LogLevel::Error => (Red, false),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(LogLevel::Log),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "debug" => Ok(LogLevel::Debug),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
