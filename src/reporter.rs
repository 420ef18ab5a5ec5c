//! Periodic status reporting
//!
//! Logs a one-line status summary on a fixed interval. The snapshot is taken
//! on the blocking pool since the system probe sleeps while sampling CPU.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use crate::manager::{ObservabilityManager, SystemInfo};

/// Shortest interval the reporter accepts
pub const MIN_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the background reporter
///
/// Intervals below [`MIN_REPORT_INTERVAL`] (including zero) are raised to it.
///
/// # Example
///
/// ```ignore
/// let obs = Arc::new(ObservabilityManager::new(config)?);
/// spawn_report_task(obs.clone(), Duration::from_secs(300));
/// ```
pub fn spawn_report_task(
    obs: Arc<ObservabilityManager>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    let interval = if interval < MIN_REPORT_INTERVAL {
        tracing::warn!(
            target: "reporter",
            requested_ms = interval.as_millis() as u64,
            "Report interval too short, using {}s",
            MIN_REPORT_INTERVAL.as_secs()
        );
        MIN_REPORT_INTERVAL
    } else {
        interval
    };

    tokio::spawn(async move {
        report_loop(obs, interval).await;
    })
}

async fn report_loop(obs: Arc<ObservabilityManager>, interval: Duration) {
    let mut ticker = time::interval(interval);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match report_now(obs.clone()).await {
            Ok(info) => log_status(&info),
            Err(e) => {
                tracing::error!(target: "reporter", error = %e, "Status report failed");
            }
        }
    }
}

/// Take one snapshot off the async runtime
pub async fn report_now(obs: Arc<ObservabilityManager>) -> Result<SystemInfo> {
    let info = tokio::task::spawn_blocking(move || obs.get_system_info()).await?;
    Ok(info)
}

fn log_status(info: &SystemInfo) {
    let unhealthy: Vec<&str> = info
        .health_status
        .unhealthy()
        .map(|(name, _)| name.as_str())
        .collect();

    if unhealthy.is_empty() {
        tracing::info!(
            target: "reporter",
            uptime = %info.uptime_formatted,
            bot_ready = info.bot_ready,
            healthy = true,
            total_errors = info.error_summary.total_errors,
            commands = info.metrics.counter_total("commands_total"),
            "Status report"
        );
    } else {
        tracing::warn!(
            target: "reporter",
            uptime = %info.uptime_formatted,
            bot_ready = info.bot_ready,
            healthy = false,
            failing = %unhealthy.join(","),
            total_errors = info.error_summary.total_errors,
            "Status report"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, ObservabilityConfig};
    use crate::health::SystemUsage;
    use crate::logging::{LogSinks, SinkLayer, GENERAL_LOG_FILE};
    use tracing_subscriber::prelude::*;

    fn manager(dir: &std::path::Path) -> Arc<ObservabilityManager> {
        let config = ObservabilityConfig {
            logging: LoggingConfig {
                dir: dir.to_path_buf(),
                console: false,
                ..LoggingConfig::default()
            },
            ..ObservabilityConfig::default()
        };
        let obs = ObservabilityManager::with_sampler(config, || -> anyhow::Result<SystemUsage> {
            Ok(SystemUsage::default())
        })
        .unwrap();
        Arc::new(obs)
    }

    #[tokio::test]
    async fn test_report_now_returns_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());
        obs.set_bot_ready(true);

        let info = report_now(obs.clone()).await.unwrap();
        assert!(info.bot_ready);
        assert!(info.health_status.overall_healthy);
        assert!(obs.health_monitor().last_check().is_some());
    }

    #[test]
    fn test_log_status_names_failing_checks() {
        let dir = tempfile::tempdir().unwrap();
        let obs = manager(dir.path());
        let info = obs.get_system_info();

        let sinks = LogSinks::shared(&obs.config().logging);
        let subscriber = tracing_subscriber::registry().with(SinkLayer::new(sinks.clone()));
        tracing::subscriber::with_default(subscriber, || log_status(&info));
        sinks.flush();

        let log = std::fs::read_to_string(dir.path().join(GENERAL_LOG_FILE)).unwrap();
        assert!(log.contains("| WARNING  | reporter | Status report"));
        assert!(log.contains("failing=bot_ready"));
    }

    #[tokio::test]
    async fn test_zero_interval_keeps_reporter_alive() {
        let dir = tempfile::tempdir().unwrap();
        let handle = spawn_report_task(manager(dir.path()), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_spawned_reporter_can_be_aborted() {
        let dir = tempfile::tempdir().unwrap();
        let handle = spawn_report_task(manager(dir.path()), Duration::from_secs(60));

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
