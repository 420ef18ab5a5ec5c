use std::time::{Duration, Instant};

use super::collector::MetricsCollector;
use super::key::Labels;

/// Scoped timing guard returned by [`MetricsCollector::timer`]
///
/// Records the elapsed wall-clock seconds into `{name}_duration` when
/// dropped, whichever way the scope is left (return, `?`, panic unwind, or a
/// cancelled future).
#[must_use = "the timer records when dropped; binding it to `_` drops it immediately"]
pub struct Timer<'a> {
    collector: &'a MetricsCollector,
    histogram: String,
    labels: Labels,
    start: Instant,
}

impl<'a> Timer<'a> {
    pub(crate) fn start(collector: &'a MetricsCollector, name: &str, labels: Labels) -> Self {
        Self {
            collector,
            histogram: format!("{}_duration", name),
            labels,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Name of the histogram this timer records into
    pub fn histogram_name(&self) -> &str {
        &self.histogram
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        let labels = std::mem::take(&mut self.labels);
        self.collector.histogram(&self.histogram, elapsed, labels);
    }
}
