//! In-process metrics
//!
//! Counters, gauges and bounded histograms keyed by name plus label set,
//! with derived stats computed on read. Values are mirrored to the
//! `metrics` facade (see [`facade`]).

pub mod collector;
pub mod facade;
pub mod histogram;
pub mod key;
pub mod timer;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use histogram::{nearest_rank, Histogram, HistogramStats, HISTOGRAM_CAPACITY};
pub use key::{Labels, MetricKey};
pub use timer::Timer;
