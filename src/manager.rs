//! Observability coordinator
//!
//! [`ObservabilityManager`] owns one metrics collector, logger, error
//! tracker and health monitor. Construct it once at startup and share it as
//! an `Arc` with everything that records telemetry.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{validate_config, ObservabilityConfig};
use crate::error::ConfigError;
use crate::error_tracker::{ErrorKind, ErrorSummary, ErrorTracker, TrackableError};
use crate::health::{HealthMonitor, HealthReport, SysinfoSampler, SystemSampler};
use crate::logging::{Fields, Level, StructuredLogger};
use crate::metrics::{facade, Labels, MetricsCollector, MetricsSnapshot};
use crate::report::format_uptime;

/// Logger name used by the manager and its components
pub const LOGGER_NAME: &str = "observability";

/// Name of the probe reporting the ready flag
pub const BOT_READY_CHECK: &str = "bot_ready";

/// Aggregate returned by [`ObservabilityManager::get_system_info`]
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub uptime_seconds: f64,
    pub uptime_formatted: String,
    pub start_time: DateTime<Local>,
    pub bot_ready: bool,
    pub metrics: MetricsSnapshot,
    pub error_summary: ErrorSummary,
    pub health_status: HealthReport,
}

pub struct ObservabilityManager {
    config: ObservabilityConfig,
    logger: StructuredLogger,
    metrics: MetricsCollector,
    errors: ErrorTracker,
    health: HealthMonitor,
    bot_ready: Arc<AtomicBool>,
    started_at: DateTime<Local>,
    started: Instant,
}

impl ObservabilityManager {
    /// Validate `config` and build every component
    pub fn new(config: ObservabilityConfig) -> Result<Self, ConfigError> {
        let sampler = SysinfoSampler::new(config.health.disk_path.clone());
        Self::with_sampler(config, sampler)
    }

    /// Same as [`new`](Self::new) with a custom system sampler
    pub fn with_sampler(
        config: ObservabilityConfig,
        sampler: impl SystemSampler + 'static,
    ) -> Result<Self, ConfigError> {
        validate_config(&config)?;
        facade::describe_metrics();

        let logger = StructuredLogger::new(LOGGER_NAME, &config.logging);
        let errors = ErrorTracker::new(logger.clone());
        let health = HealthMonitor::with_sampler(logger.clone(), config.health.clone(), sampler);

        let bot_ready = Arc::new(AtomicBool::new(false));
        let probe_flag = bot_ready.clone();
        health.register_health_check(BOT_READY_CHECK, move || {
            Ok(probe_flag.load(Ordering::SeqCst))
        });

        let manager = Self {
            config,
            logger,
            metrics: MetricsCollector::new(),
            errors,
            health,
            bot_ready,
            started_at: Local::now(),
            started: Instant::now(),
        };

        manager.logger.info(
            "Observability system initialized",
            &Fields::new().with("log_dir", manager.config.logging.dir.display().to_string()),
        );

        Ok(manager)
    }

    pub fn config(&self) -> &ObservabilityConfig {
        &self.config
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn error_tracker(&self) -> &ErrorTracker {
        &self.errors
    }

    pub fn health_monitor(&self) -> &HealthMonitor {
        &self.health
    }

    /// Set the ready flag; reported by the `bot_ready` probe
    pub fn set_bot_ready(&self, ready: bool) {
        let previous = self.bot_ready.swap(ready, Ordering::SeqCst);
        self.logger.info(
            &format!("Bot ready status set to: {}", ready),
            &Fields::new().with("previous", previous).with("ready", ready),
        );
    }

    pub fn is_bot_ready(&self) -> bool {
        self.bot_ready.load(Ordering::SeqCst)
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn register_health_check<F>(&self, name: &str, probe: F)
    where
        F: Fn() -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.health.register_health_check(name, probe);
    }

    pub fn check_health(&self) -> HealthReport {
        self.health.check_health()
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.get_metrics()
    }

    pub fn get_error_summary(&self) -> ErrorSummary {
        self.errors.get_error_summary()
    }

    pub fn track_error<E>(&self, error: &E, context: Fields)
    where
        E: TrackableError + ?Sized,
    {
        self.errors.track_error(error, context);
    }

    pub fn track(&self, kind: impl Into<ErrorKind>, message: impl Into<String>, context: Fields) {
        self.errors.track(kind, message, context);
    }

    /// Everything a status view needs, with a fresh health check
    pub fn get_system_info(&self) -> SystemInfo {
        let _timer = self.metrics.timer("observability_report", Labels::new());
        let uptime = self.uptime();

        SystemInfo {
            uptime_seconds: uptime.as_secs_f64(),
            uptime_formatted: format_uptime(uptime),
            start_time: self.started_at,
            bot_ready: self.is_bot_ready(),
            metrics: self.metrics.get_metrics(),
            error_summary: self.errors.get_error_summary(),
            health_status: self.health.check_health(),
        }
    }

    /// Count a command invocation and log it
    pub fn log_command_usage(&self, command: &str, user_id: &str, guild_id: Option<&str>, success: bool) {
        self.metrics.increment(
            "commands_total",
            Labels::new()
                .with("command", command)
                .with("success", if success { "True" } else { "False" }),
            1,
        );

        self.logger.info(
            &format!("Command executed: {}", command),
            &Fields::new()
                .with("command", command)
                .with("user_id", user_id)
                .with("guild_id", guild_id)
                .with("success", success),
        );
    }

    /// Record an operation duration into `{operation}_duration`
    ///
    /// Logged at debug, escalated to warning past the slow threshold and to
    /// error past the critical one.
    pub fn log_performance(&self, operation: &str, duration: Duration, context: Fields) {
        let seconds = duration.as_secs_f64();
        self.metrics
            .histogram(&format!("{}_duration", operation), seconds, Labels::new());

        let thresholds = &self.config.performance;
        let level = if seconds >= thresholds.critical_threshold {
            Level::Error
        } else if seconds >= thresholds.slow_threshold {
            Level::Warning
        } else {
            Level::Debug
        };

        let mut fields = Fields::new()
            .with("operation", operation)
            .with("duration", seconds);
        fields.extend(&context);

        self.logger.log(
            level,
            &format!("Performance: {} took {:.3}s", operation, seconds),
            &fields,
        );
    }

    pub fn flush(&self) {
        self.logger.flush();
    }
}

impl std::fmt::Debug for ObservabilityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservabilityManager")
            .field("started_at", &self.started_at)
            .field("bot_ready", &self.is_bot_ready())
            .field("health", &self.health)
            .finish()
    }
}
