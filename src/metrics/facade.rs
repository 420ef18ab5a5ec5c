//! Forwarding to the `metrics` facade
//!
//! Every value recorded by [`MetricsCollector`](super::MetricsCollector) is
//! mirrored here. Without an installed recorder these calls are no-ops; a
//! host that installs one (Prometheus exporter, statsd, ...) sees the same
//! series under the same names and labels.

use metrics::{counter, describe_counter, describe_histogram, gauge, histogram, Label};
use std::sync::Once;

use super::key::Labels;

fn to_labels(labels: &Labels) -> Vec<Label> {
    labels
        .iter()
        .map(|(k, v)| Label::new(k.clone(), v.clone()))
        .collect()
}

/// Describe the series recorded by the manager itself
///
/// Safe to call more than once; descriptions are registered on first call.
pub fn describe_metrics() {
    static DESCRIBED: Once = Once::new();
    DESCRIBED.call_once(|| {
        describe_counter!("commands_total", "Total number of bot commands executed");
        describe_histogram!(
            "observability_report_duration",
            "Seconds spent composing a system info snapshot"
        );
    });
}

pub fn record_counter(name: &str, labels: &Labels, amount: i64) {
    // The facade only models monotonic counters
    if amount <= 0 {
        return;
    }
    counter!(name.to_string(), to_labels(labels)).increment(amount as u64);
}

pub fn record_gauge(name: &str, labels: &Labels, value: f64) {
    gauge!(name.to_string(), to_labels(labels)).set(value);
}

pub fn record_histogram(name: &str, labels: &Labels, value: f64) {
    histogram!(name.to_string(), to_labels(labels)).record(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarding_without_recorder_is_noop() {
        describe_metrics();
        describe_metrics();

        let labels = Labels::new().with("command", "arkdle");
        record_counter("commands_total", &labels, 1);
        record_counter("commands_total", &labels, -3);
        record_gauge("active_games", &Labels::new(), 2.0);
        record_histogram("command_arkdle_duration", &Labels::new(), 0.12);
    }
}
