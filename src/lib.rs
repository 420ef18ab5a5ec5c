pub mod config;
pub mod dashboard;
pub mod error;
pub mod error_tracker;
pub mod health;
pub mod instrument;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod report;
pub mod reporter;

pub use config::ObservabilityConfig;
pub use error::{BotError, ConfigError};
pub use error_tracker::{ErrorKind, ErrorSummary, ErrorTracker, TrackableError, TrackedError};
pub use health::{CheckResult, HealthMonitor, HealthReport};
pub use instrument::{
    instrument_command, instrument_command_blocking, monitor_performance,
    monitor_performance_async, CommandInvocation,
};
pub use logging::{Fields, Level, StructuredLogger};
pub use manager::{ObservabilityManager, SystemInfo};
pub use metrics::{Labels, MetricsCollector, MetricsSnapshot};

use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::logging::{LogSinks, SinkLayer};

/// Initialize tracing so `tracing` events land in the structured log sinks
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `logging.level`. Only the first call installs a subscriber; later calls
/// print a warning and leave the existing one in place.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_directive(config)));

    let sink_layer = SinkLayer::new(LogSinks::shared(config));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(sink_layer)
        .try_init();

    if let Err(e) = result {
        eprintln!("Warning: tracing already initialized: {}", e);
    }
}

/// `EnvFilter` directive matching a structured log level
fn tracing_directive(config: &LoggingConfig) -> &'static str {
    match config.level() {
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warning => "warn",
        Level::Error | Level::Critical => "error",
    }
}
