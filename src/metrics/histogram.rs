//! Bounded sample histograms and derived statistics
//!
//! Samples are kept in arrival order up to [`HISTOGRAM_CAPACITY`]; older
//! samples are dropped first. Percentiles use the nearest-rank method on the
//! retained window:
//!
//! ```text
//! index = floor(count * p / 100), clamped to count - 1
//! ```

use serde::Serialize;
use std::collections::VecDeque;

/// Maximum samples retained per histogram
pub const HISTOGRAM_CAPACITY: usize = 1000;

/// FIFO-bounded sample window
#[derive(Debug, Clone)]
pub struct Histogram {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_capacity(HISTOGRAM_CAPACITY)
    }
}

impl Histogram {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(HISTOGRAM_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, dropping the oldest ones beyond capacity
    pub fn record(&mut self, value: f64) {
        self.samples.push_back(value);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn stats(&self) -> HistogramStats {
        HistogramStats::from_samples(self.samples.iter().copied())
    }
}

/// Summary of one histogram window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p95: f64,
    pub p99: f64,
}

impl HistogramStats {
    /// Compute stats over a set of samples; every field is zero when empty
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = samples.into_iter().collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            avg: sum / count as f64,
            p95: nearest_rank(&sorted, 95),
            p99: nearest_rank(&sorted, 99),
        }
    }
}

/// Nearest-rank percentile over ascending samples
///
/// Returns 0.0 for an empty slice.
pub fn nearest_rank(sorted: &[f64], percentile: u32) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (sorted.len() * percentile as usize / 100).min(sorted.len() - 1);
    sorted[index]
}
