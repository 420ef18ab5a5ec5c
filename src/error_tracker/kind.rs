//! Error kind tagging
//!
//! The tracker never inspects error objects directly: anything it records
//! goes through [`TrackableError`], which names the kind and optionally a
//! trace. Callers with only a tag and a message use
//! [`ErrorTracker::track`](super::ErrorTracker::track) instead.

use serde::Serialize;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use crate::error::BotError;
use crate::logging::error_chain;

/// Kind identifier of a tracked error, e.g. `ScoreError` or `IoError`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ErrorKind(Cow<'static, str>);

impl ErrorKind {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Kind named after a Rust type, without module path or generics
    pub fn of<T: ?Sized>() -> Self {
        Self::new(short_type_name(std::any::type_name::<T>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ErrorKind {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for ErrorKind {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Kind recorded for a handler that panicked
pub const PANIC_KIND: ErrorKind = ErrorKind::from_static("Panic");

/// Text of a panic payload, when it carries one
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(message) = payload.downcast_ref::<&str>() {
        Some((*message).to_string())
    } else {
        payload.downcast_ref::<String>().cloned()
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// An error the tracker can record
pub trait TrackableError: fmt::Display {
    fn kind(&self) -> ErrorKind;

    /// Trace text stored with the error; empty when there is none
    fn trace(&self) -> String {
        String::new()
    }
}

impl TrackableError for BotError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::from_static(self.kind_name())
    }

    fn trace(&self) -> String {
        error_chain(self)
    }
}

impl TrackableError for std::io::Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::from_static("IoError")
    }

    fn trace(&self) -> String {
        error_chain(self)
    }
}

impl TrackableError for anyhow::Error {
    /// Kind of the root error when it is one the crate knows, else `Error`
    fn kind(&self) -> ErrorKind {
        if let Some(bot) = self.downcast_ref::<BotError>() {
            return bot.kind();
        }
        if let Some(io) = self.downcast_ref::<std::io::Error>() {
            return TrackableError::kind(io);
        }
        ErrorKind::from_static("Error")
    }

    fn trace(&self) -> String {
        error_chain(&**self)
    }
}
