//! Structured logging
//!
//! Every logger renders `timestamp | LEVEL | name | message | k=v | k=v` and
//! writes it to three sinks:
//!
//! ```text
//! console   (stderr)      INFO and above
//! bot.log   (rotating)    DEBUG and above
//! errors.log (rotating)   ERROR and above
//! ```
//!
//! Loggers are cheap handles: the sinks behind them are shared per log
//! directory (see [`LogSinks::shared`]), so constructing a logger for a name
//! or directory that is already set up never attaches a second set of sinks.
//! Logging calls never fail; sink errors are swallowed and counted.

pub mod fields;
pub mod format;
pub mod layer;
pub mod sink;

pub use fields::{FieldValue, Fields};
pub use format::{format_line, Level, LogRecord};
pub use layer::SinkLayer;
pub use sink::{LogSinks, RotatingFile, ERROR_LOG_FILE, GENERAL_LOG_FILE};

use std::error::Error as StdError;
use std::sync::Arc;

use crate::config::LoggingConfig;

/// Named logger with key/value context
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    name: Arc<str>,
    level: Level,
    sinks: Arc<LogSinks>,
}

impl StructuredLogger {
    /// Create a logger writing to the shared sinks of `config.dir`
    pub fn new(name: &str, config: &LoggingConfig) -> Self {
        Self::with_sinks(name, config.level(), LogSinks::shared(config))
    }

    /// Create a logger over explicit sinks
    pub fn with_sinks(name: &str, level: Level, sinks: Arc<LogSinks>) -> Self {
        Self {
            name: Arc::from(name),
            level,
            sinks,
        }
    }

    /// Another logger sharing this one's sinks and level
    pub fn named(&self, name: &str) -> Self {
        Self::with_sinks(name, self.level, self.sinks.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sinks(&self) -> &Arc<LogSinks> {
        &self.sinks
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    pub fn log(&self, level: Level, message: &str, fields: &Fields) {
        if !self.enabled(level) {
            return;
        }
        self.sinks
            .write(&LogRecord::now(level, &self.name, message, fields));
    }

    pub fn debug(&self, message: &str, fields: &Fields) {
        self.log(Level::Debug, message, fields);
    }

    pub fn info(&self, message: &str, fields: &Fields) {
        self.log(Level::Info, message, fields);
    }

    pub fn warning(&self, message: &str, fields: &Fields) {
        self.log(Level::Warning, message, fields);
    }

    pub fn error(&self, message: &str, fields: &Fields) {
        self.log(Level::Error, message, fields);
    }

    pub fn critical(&self, message: &str, fields: &Fields) {
        self.log(Level::Critical, message, fields);
    }

    /// Log at error level with the error and its cause chain appended
    pub fn exception(&self, message: &str, error: &(dyn StdError + 'static), fields: &Fields) {
        if !self.enabled(Level::Error) {
            return;
        }

        let mut fields = fields.clone();
        fields.insert("error", error.to_string());

        let trace = error_chain(error);
        let full = if trace.is_empty() {
            message.to_string()
        } else {
            format!("{}\n{}", message, trace)
        };

        self.log(Level::Error, &full, &fields);
    }

    pub fn flush(&self) {
        self.sinks.flush();
    }
}

/// Render the `source()` chain of an error, one cause per line
///
/// Returns an empty string when the error has no source.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut lines = Vec::new();
    let mut current = error.source();
    while let Some(cause) = current {
        lines.push(format!("Caused by: {}", cause));
        current = cause.source();
    }
    lines.join("\n")
}
