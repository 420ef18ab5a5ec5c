use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::facade;
use super::histogram::{Histogram, HistogramStats};
use super::key::{Labels, MetricKey};
use super::timer::Timer;

/// Thread-safe counters, gauges and histograms keyed by name plus labels
#[derive(Debug, Default)]
pub struct MetricsCollector {
    state: Mutex<MetricsState>,
}

#[derive(Debug, Default)]
struct MetricsState {
    counters: HashMap<MetricKey, i64>,
    gauges: HashMap<MetricKey, f64>,
    histograms: HashMap<MetricKey, Histogram>,
}

/// Point-in-time copy of every metric, keyed by canonical key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, i64>,
    pub gauges: BTreeMap<String, f64>,
    pub histograms: BTreeMap<String, HistogramStats>,
}

impl MetricsSnapshot {
    /// Sum of a counter over every label set it was recorded with
    pub fn counter_total(&self, name: &str) -> i64 {
        let bare = MetricKey::new(name, Labels::new()).canonical();
        self.counters
            .iter()
            .filter(|(key, _)| is_series_of(key, &bare))
            .map(|(_, value)| *value)
            .sum()
    }
}

/// Whether `canonical` is `bare` or `bare` followed by a label block
///
/// Escaped names never contain a bare `{`, so the first one opens the labels.
fn is_series_of(canonical: &str, bare: &str) -> bool {
    match canonical.strip_prefix(bare) {
        Some(rest) => rest.is_empty() || rest.starts_with('{'),
        None => false,
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to a counter
    ///
    /// Negative amounts are accepted but unsupported: counters are meant to
    /// be monotonic.
    pub fn increment(&self, name: &str, labels: impl Into<Labels>, amount: i64) {
        let labels = labels.into();
        facade::record_counter(name, &labels, amount);

        let key = MetricKey::new(name, labels);
        *self.state.lock().counters.entry(key).or_insert(0) += amount;
    }

    /// Overwrite a gauge
    pub fn gauge(&self, name: &str, value: f64, labels: impl Into<Labels>) {
        let labels = labels.into();
        facade::record_gauge(name, &labels, value);

        let key = MetricKey::new(name, labels);
        self.state.lock().gauges.insert(key, value);
    }

    /// Append a histogram sample
    pub fn histogram(&self, name: &str, value: f64, labels: impl Into<Labels>) {
        let labels = labels.into();
        facade::record_histogram(name, &labels, value);

        let key = MetricKey::new(name, labels);
        self.state
            .lock()
            .histograms
            .entry(key)
            .or_default()
            .record(value);
    }

    /// Start a scoped timer recording into `{name}_duration` on drop
    pub fn timer(&self, name: &str, labels: impl Into<Labels>) -> Timer<'_> {
        Timer::start(self, name, labels.into())
    }

    /// Current counter value, 0 if never incremented
    pub fn counter_value(&self, name: &str, labels: impl Into<Labels>) -> i64 {
        let key = MetricKey::new(name, labels.into());
        self.state.lock().counters.get(&key).copied().unwrap_or(0)
    }

    /// Stats for one histogram; all zero if it has no samples
    pub fn histogram_stats(&self, name: &str, labels: impl Into<Labels>) -> HistogramStats {
        let key = MetricKey::new(name, labels.into());
        self.state
            .lock()
            .histograms
            .get(&key)
            .map(Histogram::stats)
            .unwrap_or_default()
    }

    /// Consistent snapshot of every metric
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let state = self.state.lock();

        MetricsSnapshot {
            counters: state
                .counters
                .iter()
                .map(|(key, value)| (key.canonical(), *value))
                .collect(),
            gauges: state
                .gauges
                .iter()
                .map(|(key, value)| (key.canonical(), *value))
                .collect(),
            histograms: state
                .histograms
                .iter()
                .map(|(key, histogram)| (key.canonical(), histogram.stats()))
                .collect(),
        }
    }
}
