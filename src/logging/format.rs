//! Line format shared by every sink
//!
//! `timestamp | LEVEL    | logger-name | message | k=v | k=v`

use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;

use super::fields::Fields;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so width specifiers like {:<8} apply
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

/// One record on its way to the sinks; never retained
#[derive(Debug)]
pub struct LogRecord<'a> {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub logger: &'a str,
    pub message: &'a str,
    pub fields: &'a Fields,
}

impl<'a> LogRecord<'a> {
    pub fn now(level: Level, logger: &'a str, message: &'a str, fields: &'a Fields) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            logger,
            message,
            fields,
        }
    }
}

/// Render a record as a single line (without trailing newline)
pub fn format_line(record: &LogRecord<'_>) -> String {
    let mut line = format!(
        "{} | {:<8} | {} | {}",
        record.timestamp.format(TIMESTAMP_FORMAT),
        record.level,
        record.logger,
        record.message
    );

    if !record.fields.is_empty() {
        line.push_str(" | ");
        line.push_str(&record.fields.render());
    }

    line
}
