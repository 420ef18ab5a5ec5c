//! Instrumentation wrappers for command handlers and other units of work
//!
//! The wrappers never change what the wrapped code returns: errors are
//! recorded and handed back untouched.
//!
//! If a wrapped future is dropped before completing, the elapsed time is
//! still recorded by the timer guard but no success/error accounting (and no
//! command usage) is emitted for that invocation.
//!
//! A command handler that panics is recorded as a failed invocation with a
//! `Panic` error, then the panic resumes.

use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::time::Instant;

use crate::error_tracker::{panic_message, TrackableError, PANIC_KIND};
use crate::logging::Fields;
use crate::manager::ObservabilityManager;
use crate::metrics::Labels;

/// Who invoked a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub user_id: String,
    pub guild_id: Option<String>,
}

impl CommandInvocation {
    pub fn new(user_id: impl Into<String>, guild_id: Option<impl Into<String>>) -> Self {
        Self {
            user_id: user_id.into(),
            guild_id: guild_id.map(Into::into),
        }
    }

    /// Invocation outside a guild (direct message)
    pub fn direct(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            guild_id: None,
        }
    }
}

fn operation_context(operation: &str, labels: &Labels) -> Fields {
    Fields::new()
        .with("operation", operation)
        .with("labels", labels.to_string())
}

fn settle<T, E>(
    obs: &ObservabilityManager,
    operation: &str,
    labels: &Labels,
    result: &Result<T, E>,
) where
    E: TrackableError,
{
    match result {
        Ok(_) => obs
            .metrics()
            .increment(&format!("{}_success", operation), labels.clone(), 1),
        Err(error) => {
            obs.metrics()
                .increment(&format!("{}_error", operation), labels.clone(), 1);
            obs.track_error(error, operation_context(operation, labels));
        }
    }
}

/// Time a synchronous unit of work and count its outcome
///
/// Records `{operation}_duration`, then `{operation}_success` or
/// `{operation}_error`; errors are also sent to the error tracker.
pub fn monitor_performance<T, E, F>(
    obs: &ObservabilityManager,
    operation: &str,
    labels: &Labels,
    f: F,
) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: TrackableError,
{
    let _timer = obs.metrics().timer(operation, labels.clone());
    let result = f();
    settle(obs, operation, labels, &result);
    result
}

/// Async counterpart of [`monitor_performance`]
///
/// The duration includes time spent suspended.
pub async fn monitor_performance_async<T, E, Fut>(
    obs: &ObservabilityManager,
    operation: &str,
    labels: &Labels,
    fut: Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: TrackableError,
{
    let _timer = obs.metrics().timer(operation, labels.clone());
    let result = fut.await;
    settle(obs, operation, labels, &result);
    result
}

fn command_context(command: &str, invocation: &CommandInvocation) -> Fields {
    Fields::new()
        .with("command", command)
        .with("user_id", invocation.user_id.as_str())
        .with("guild_id", invocation.guild_id.as_deref())
}

fn finish_command(
    obs: &ObservabilityManager,
    command: &str,
    invocation: &CommandInvocation,
    started: Instant,
    success: bool,
) {
    obs.log_command_usage(
        command,
        &invocation.user_id,
        invocation.guild_id.as_deref(),
        success,
    );
    obs.log_performance(
        &format!("command_{}", command),
        started.elapsed(),
        Fields::new().with("user_id", invocation.user_id.as_str()),
    );
}

fn record_command<T, E>(
    obs: &ObservabilityManager,
    command: &str,
    invocation: &CommandInvocation,
    started: Instant,
    result: &Result<T, E>,
) where
    E: TrackableError,
{
    if let Err(error) = result {
        obs.track_error(error, command_context(command, invocation));
    }
    finish_command(obs, command, invocation, started, result.is_ok());
}

fn record_command_panic(
    obs: &ObservabilityManager,
    command: &str,
    invocation: &CommandInvocation,
    started: Instant,
    payload: &(dyn Any + Send),
) {
    let message = panic_message(payload).unwrap_or_else(|| "command panicked".to_string());
    obs.track(PANIC_KIND, message, command_context(command, invocation));
    finish_command(obs, command, invocation, started, false);
}

/// Run a command handler with usage, latency and error accounting
///
/// Without an invocation the handler runs unmodified.
pub async fn instrument_command<T, E, Fut>(
    obs: &ObservabilityManager,
    command: &str,
    invocation: Option<&CommandInvocation>,
    fut: Fut,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: TrackableError,
{
    let Some(invocation) = invocation else {
        return fut.await;
    };

    let started = Instant::now();
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => {
            record_command(obs, command, invocation, started, &result);
            result
        }
        Err(payload) => {
            record_command_panic(obs, command, invocation, started, payload.as_ref());
            resume_unwind(payload)
        }
    }
}

/// Blocking counterpart of [`instrument_command`]
pub fn instrument_command_blocking<T, E, F>(
    obs: &ObservabilityManager,
    command: &str,
    invocation: Option<&CommandInvocation>,
    f: F,
) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: TrackableError,
{
    let Some(invocation) = invocation else {
        return f();
    };

    let started = Instant::now();
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => {
            record_command(obs, command, invocation, started, &result);
            result
        }
        Err(payload) => {
            record_command_panic(obs, command, invocation, started, payload.as_ref());
            resume_unwind(payload)
        }
    }
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.guild_id {
            Some(guild) => write!(f, "user {} in guild {}", self.user_id, guild),
            None => write!(f, "user {} (direct)", self.user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, ObservabilityConfig};
    use crate::error::BotError;
    use crate::health::SystemUsage;
    use std::path::Path;
    use std::time::Duration;

    fn manager(dir: &Path) -> ObservabilityManager {
        let config = ObservabilityConfig {
            logging: LoggingConfig {
                dir: dir.to_path_buf(),
                console: false,
                ..LoggingConfig::default()
            },
            ..ObservabilityConfig::default()
        };
        ObservabilityManager::with_sampler(config, || -> anyhow::Result<SystemUsage> {
            Ok(SystemUsage::default())
        })
        .unwrap()
    }

    #[test]
    fn test_monitor_performance_success() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());
        let labels = Labels::new().with("source", "disk");

        let value: Result<u32, BotError> = monitor_performance(&obs, "load_scores", &labels, || Ok(7));
        assert_eq!(value.unwrap(), 7);

        let metrics = obs.metrics();
        assert_eq!(metrics.counter_value("load_scores_success", labels.clone()), 1);
        assert_eq!(metrics.counter_value("load_scores_error", labels.clone()), 0);
        assert_eq!(metrics.histogram_stats("load_scores_duration", labels).count, 1);
    }

    #[test]
    fn test_monitor_performance_error_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());
        let labels = Labels::new();

        let result: Result<(), BotError> = monitor_performance(&obs, "save_scores", &labels, || {
            Err(BotError::Score("disk full".to_string()))
        });

        assert!(matches!(result, Err(BotError::Score(ref m)) if m == "disk full"));
        assert_eq!(obs.metrics().counter_value("save_scores_error", Labels::new()), 1);

        let summary = obs.get_error_summary();
        assert_eq!(summary.count("ScoreError"), 1);
        assert_eq!(
            summary.recent_errors[0].context.get("operation").map(ToString::to_string),
            Some("save_scores".to_string())
        );
    }

    #[tokio::test]
    async fn test_monitor_performance_async_includes_suspension() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());

        let result: Result<&str, BotError> =
            monitor_performance_async(&obs, "fetch_operator", &Labels::new(), async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok("Amiya")
            })
            .await;

        assert_eq!(result.unwrap(), "Amiya");
        let stats = obs
            .metrics()
            .histogram_stats("fetch_operator_duration", Labels::new());
        assert_eq!(stats.count, 1);
        assert!(stats.min >= 0.02);
    }

    #[tokio::test]
    async fn test_instrument_command_without_invocation_is_transparent() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());

        let result: Result<u8, BotError> = instrument_command(&obs, "ping", None, async { Ok(1) }).await;
        assert_eq!(result.unwrap(), 1);
        assert!(obs.get_metrics().counters.is_empty());
    }

    #[tokio::test]
    async fn test_instrument_command_success() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());
        let invocation = CommandInvocation::new("42", Some("7"));

        let result: Result<(), BotError> =
            instrument_command(&obs, "arkdle", Some(&invocation), async { Ok(()) }).await;
        assert!(result.is_ok());

        let metrics = obs.get_metrics();
        assert_eq!(metrics.counters["commands_total{command=arkdle,success=True}"], 1);
        assert_eq!(metrics.histograms["command_arkdle_duration"].count, 1);
        assert_eq!(obs.get_error_summary().total_errors, 0);
    }

    #[test]
    fn test_blocking_command_failure_is_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());
        let invocation = CommandInvocation::direct("42");

        let result: Result<(), BotError> =
            instrument_command_blocking(&obs, "guess", Some(&invocation), || {
                Err(BotError::InvalidGameState("no game running".to_string()))
            });
        assert!(result.is_err());

        let summary = obs.get_error_summary();
        assert_eq!(summary.count("InvalidGameStateError"), 1);
        let context = &summary.recent_errors[0].context;
        assert_eq!(context.get("command").map(ToString::to_string), Some("guess".to_string()));
        assert_eq!(context.get("guild_id").map(ToString::to_string), Some("None".to_string()));

        assert_eq!(
            obs.get_metrics().counters["commands_total{command=guess,success=False}"],
            1
        );
    }

    #[test]
    fn test_blocking_command_panic_is_recorded_then_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());
        let invocation = CommandInvocation::new("42", Some("7"));

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            instrument_command_blocking(&obs, "boom", Some(&invocation), || -> Result<(), BotError> {
                panic!("operator table missing")
            })
        }));
        assert!(outcome.is_err());

        let metrics = obs.get_metrics();
        assert_eq!(metrics.counters["commands_total{command=boom,success=False}"], 1);
        assert_eq!(metrics.histograms["command_boom_duration"].count, 1);

        let summary = obs.get_error_summary();
        assert_eq!(summary.count("Panic"), 1);
        assert_eq!(summary.recent_errors[0].message, "operator table missing");
        assert_eq!(
            summary.recent_errors[0].context.get("command").map(ToString::to_string),
            Some("boom".to_string())
        );
    }

    #[tokio::test]
    async fn test_async_command_panic_is_recorded_then_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());
        let invocation = CommandInvocation::direct("42");

        let outcome = AssertUnwindSafe(instrument_command(
            &obs,
            "boom",
            Some(&invocation),
            async {
                tokio::task::yield_now().await;
                if invocation.user_id == "42" {
                    panic!("silhouette cache poisoned");
                }
                Ok::<(), BotError>(())
            },
        ))
        .catch_unwind()
        .await;
        assert!(outcome.is_err());

        let metrics = obs.get_metrics();
        assert_eq!(metrics.counters["commands_total{command=boom,success=False}"], 1);
        assert_eq!(metrics.histograms["command_boom_duration"].count, 1);
        assert_eq!(obs.get_error_summary().count("Panic"), 1);
    }

    #[test]
    fn test_invocation_display() {
        assert_eq!(CommandInvocation::new("1", Some("2")).to_string(), "user 1 in guild 2");
        assert_eq!(CommandInvocation::direct("1").to_string(), "user 1 (direct)");
    }
}
