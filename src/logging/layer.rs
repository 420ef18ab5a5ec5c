//! Tracing layer for structured sinks
//!
//! This module provides a tracing layer that writes `tracing` events to the
//! same console/file sinks as [`StructuredLogger`](super::StructuredLogger),
//! using the event target as the logger name.

use super::fields::{FieldValue, Fields};
use super::format::{Level, LogRecord};
use super::sink::LogSinks;
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

/// Tracing layer that forwards events to structured log sinks
pub struct SinkLayer {
    sinks: Arc<LogSinks>,
}

impl SinkLayer {
    pub fn new(sinks: Arc<LogSinks>) -> Self {
        Self { sinks }
    }
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = FieldVisitor {
            message: None,
            fields: Fields::new(),
        };
        event.record(&mut visitor);

        let message = visitor.message.unwrap_or_default();
        let record = LogRecord::now(
            Level::from(metadata.level()),
            metadata.target(),
            &message,
            &visitor.fields,
        );

        self.sinks.write(&record);
    }
}

/// Visitor to extract the message and typed fields from an event
struct FieldVisitor {
    message: Option<String>,
    fields: Fields,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value_str = format!("{:?}", value);
        match field.name() {
            "message" => self.message = Some(value_str.trim_matches('"').to_string()),
            name => self.fields.insert(name, value_str),
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            name => self.fields.insert(name, value),
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(field.name(), value);
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name(), value);
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.fields.insert(field.name(), FieldValue::Float(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name(), value);
    }
}
