//! Error tracking
//!
//! Keeps a per-kind count of every error ever tracked plus the most recent
//! [`RECENT_ERRORS_CAPACITY`] errors in arrival order. Each tracked error is
//! also written as one error-level log line.

pub mod kind;

pub use kind::{panic_message, ErrorKind, TrackableError, PANIC_KIND};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::logging::{Fields, StructuredLogger};

/// Recent errors kept for inspection; older ones are discarded first
pub const RECENT_ERRORS_CAPACITY: usize = 100;

/// One recorded error
#[derive(Debug, Clone, Serialize)]
pub struct TrackedError {
    pub timestamp: DateTime<Local>,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub context: Fields,
    pub trace: String,
}

/// Snapshot returned by [`ErrorTracker::get_error_summary`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorSummary {
    pub error_counts: BTreeMap<String, u64>,
    /// Oldest first
    pub recent_errors: Vec<TrackedError>,
    pub total_errors: u64,
}

impl ErrorSummary {
    pub fn count(&self, kind: &str) -> u64 {
        self.error_counts.get(kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    counts: HashMap<ErrorKind, u64>,
    recent: VecDeque<TrackedError>,
}

#[derive(Debug)]
pub struct ErrorTracker {
    logger: StructuredLogger,
    capacity: usize,
    state: Mutex<TrackerState>,
}

impl ErrorTracker {
    pub fn new(logger: StructuredLogger) -> Self {
        Self::with_capacity(logger, RECENT_ERRORS_CAPACITY)
    }

    pub fn with_capacity(logger: StructuredLogger, capacity: usize) -> Self {
        Self {
            logger,
            capacity: capacity.max(1),
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Record an error object
    pub fn track_error<E>(&self, error: &E, context: Fields)
    where
        E: TrackableError + ?Sized,
    {
        self.record(error.kind(), error.to_string(), context, error.trace());
    }

    /// Record an error from an explicit kind tag and message
    pub fn track(&self, kind: impl Into<ErrorKind>, message: impl Into<String>, context: Fields) {
        self.record(kind.into(), message.into(), context, String::new());
    }

    fn record(&self, kind: ErrorKind, message: String, context: Fields, trace: String) {
        let mut fields = Fields::new()
            .with("error_type", kind.as_str())
            .with("error_message", message.as_str());
        fields.extend(&context);

        let tracked = TrackedError {
            timestamp: Local::now(),
            kind: kind.clone(),
            message,
            context,
            trace,
        };

        {
            let mut state = self.state.lock();
            *state.counts.entry(kind.clone()).or_insert(0) += 1;
            state.recent.push_back(tracked);
            while state.recent.len() > self.capacity {
                state.recent.pop_front();
            }
        }

        self.logger
            .error(&format!("Error tracked: {}", kind), &fields);
    }

    pub fn get_error_summary(&self) -> ErrorSummary {
        let state = self.state.lock();

        let error_counts: BTreeMap<String, u64> = state
            .counts
            .iter()
            .map(|(kind, count)| (kind.to_string(), *count))
            .collect();
        let total_errors = error_counts.values().sum();

        ErrorSummary {
            error_counts,
            recent_errors: state.recent.iter().cloned().collect(),
            total_errors,
        }
    }

    /// Latest `limit` errors, newest first
    pub fn recent(&self, limit: usize) -> Vec<TrackedError> {
        self.state
            .lock()
            .recent
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use crate::error::BotError;
    use crate::logging::{FieldValue, ERROR_LOG_FILE};
    use std::path::Path;

    fn test_logger(dir: &Path) -> StructuredLogger {
        StructuredLogger::new(
            "error_tracker",
            &LoggingConfig {
                dir: dir.to_path_buf(),
                console: false,
                ..LoggingConfig::default()
            },
        )
    }

    #[test]
    fn test_track_error_counts_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let logger = test_logger(dir.path());
        let tracker = ErrorTracker::new(logger.clone());

        let error = BotError::Game("no active game".to_string());
        tracker.track_error(&error, Fields::new().with("test", "context"));
        logger.flush();

        let summary = tracker.get_error_summary();
        assert_eq!(summary.total_errors, 1);
        assert_eq!(summary.count("GameError"), 1);

        let recent = &summary.recent_errors[0];
        assert_eq!(recent.kind.as_str(), "GameError");
        assert_eq!(recent.message, "no active game");
        assert_eq!(recent.context.get("test"), Some(&FieldValue::from("context")));

        let errors = std::fs::read_to_string(dir.path().join(ERROR_LOG_FILE)).unwrap();
        assert!(errors.contains(
            "Error tracked: GameError | error_type=GameError | error_message=no active game | test=context"
        ));
    }

    #[test]
    fn test_ring_buffer_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ErrorTracker::new(test_logger(dir.path()));

        for i in 0..150 {
            tracker.track("ValueError", format!("error {}", i), Fields::new());
        }

        let summary = tracker.get_error_summary();
        assert_eq!(summary.recent_errors.len(), RECENT_ERRORS_CAPACITY);
        assert_eq!(summary.recent_errors[0].message, "error 50");
        assert_eq!(summary.recent_errors[99].message, "error 149");
        assert_eq!(summary.count("ValueError"), 150);
        assert_eq!(summary.total_errors, 150);
    }

    #[test]
    fn test_total_is_sum_of_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ErrorTracker::new(test_logger(dir.path()));

        tracker.track("ScoreError", "a", Fields::new());
        tracker.track("ScoreError", "b", Fields::new());
        tracker.track_error(
            &std::io::Error::new(std::io::ErrorKind::Other, "c"),
            Fields::new(),
        );

        let summary = tracker.get_error_summary();
        assert_eq!(summary.count("ScoreError"), 2);
        assert_eq!(summary.count("IoError"), 1);
        assert_eq!(summary.total_errors, 3);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ErrorTracker::new(test_logger(dir.path()));
        for i in 0..5 {
            tracker.track("DataError", format!("e{}", i), Fields::new());
        }

        let latest: Vec<_> = tracker.recent(2).into_iter().map(|e| e.message).collect();
        assert_eq!(latest, vec!["e4", "e3"]);
    }

    #[test]
    fn test_anyhow_trace_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ErrorTracker::new(test_logger(dir.path()));

        let error = anyhow::anyhow!("disk full").context("save scores");
        tracker.track_error(&error, Fields::new());

        let summary = tracker.get_error_summary();
        assert_eq!(summary.recent_errors[0].message, "save scores");
        assert_eq!(summary.recent_errors[0].trace, "Caused by: disk full");
        assert_eq!(summary.count("Error"), 1);
    }
}
