use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::system::{SysinfoSampler, SystemSampler, SystemUsage};
use crate::config::HealthConfig;
use crate::error_tracker::panic_message;
use crate::logging::{Fields, StructuredLogger};

/// Name of the built-in resource probe
pub const SYSTEM_CHECK: &str = "system";

/// A registered probe: `Ok(true)` means healthy
pub type HealthProbe = Arc<dyn Fn() -> anyhow::Result<bool> + Send + Sync>;

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub usage: Option<SystemUsage>,
}

impl CheckResult {
    fn passed(healthy: bool) -> Self {
        Self {
            healthy,
            error: None,
            usage: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            healthy: false,
            error: Some(error),
            usage: None,
        }
    }
}

/// Result of one full health evaluation
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Local>,
    pub overall_healthy: bool,
    pub results: BTreeMap<String, CheckResult>,
}

impl HealthReport {
    pub fn unhealthy(&self) -> impl Iterator<Item = (&String, &CheckResult)> {
        self.results.iter().filter(|(_, result)| !result.healthy)
    }
}

/// Runs the system probe plus registered probes on demand
pub struct HealthMonitor {
    logger: StructuredLogger,
    thresholds: HealthConfig,
    sampler: Box<dyn SystemSampler>,
    checks: RwLock<Vec<(String, HealthProbe)>>,
    last_check: Mutex<Option<HealthReport>>,
}

impl HealthMonitor {
    /// Monitor sampling the host through `sysinfo`
    pub fn new(logger: StructuredLogger, thresholds: HealthConfig) -> Self {
        let sampler = SysinfoSampler::new(thresholds.disk_path.clone());
        Self::with_sampler(logger, thresholds, sampler)
    }

    pub fn with_sampler(
        logger: StructuredLogger,
        thresholds: HealthConfig,
        sampler: impl SystemSampler + 'static,
    ) -> Self {
        Self {
            logger,
            thresholds,
            sampler: Box::new(sampler),
            checks: RwLock::new(Vec::new()),
            last_check: Mutex::new(None),
        }
    }

    /// Register a probe; an existing probe with the same name is replaced
    pub fn register_health_check<F>(&self, name: &str, probe: F)
    where
        F: Fn() -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        let probe: HealthProbe = Arc::new(probe);
        let mut checks = self.checks.write();

        match checks.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = probe,
            None => checks.push((name.to_string(), probe)),
        }
        drop(checks);

        self.logger.debug(
            "Health check registered",
            &Fields::new().with("check", name),
        );
    }

    pub fn registered_checks(&self) -> Vec<String> {
        self.checks.read().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Evaluate every probe and remember the result
    pub fn check_health(&self) -> HealthReport {
        let mut results = BTreeMap::new();
        results.insert(SYSTEM_CHECK.to_string(), self.check_system());

        // Probes run outside the lock so they may register other probes
        let checks = self.checks.read().clone();
        for (name, probe) in checks {
            results.insert(name, run_probe(probe.as_ref()));
        }

        let report = HealthReport {
            timestamp: Local::now(),
            overall_healthy: results.values().all(|result| result.healthy),
            results,
        };

        for (name, result) in report.unhealthy() {
            let mut fields = Fields::new().with("check", name.as_str());
            if let Some(error) = &result.error {
                fields.insert("error", error.as_str());
            }
            if let Some(usage) = &result.usage {
                fields.insert("cpu_percent", usage.cpu_percent);
                fields.insert("memory_percent", usage.memory_percent);
                fields.insert("disk_percent", usage.disk_percent);
            }
            self.logger.warning("Health check failed", &fields);
        }

        *self.last_check.lock() = Some(report.clone());
        report
    }

    /// Most recent report, without re-running any probe
    pub fn last_check(&self) -> Option<HealthReport> {
        self.last_check.lock().clone()
    }

    fn check_system(&self) -> CheckResult {
        let sampled = catch_unwind(AssertUnwindSafe(|| self.sampler.sample()));

        match sampled {
            Ok(Ok(usage)) => CheckResult {
                healthy: usage.within(&self.thresholds),
                error: None,
                usage: Some(usage),
            },
            Ok(Err(error)) => CheckResult::failed(error.to_string()),
            Err(panic) => CheckResult::failed(probe_panic(panic.as_ref())),
        }
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("thresholds", &self.thresholds)
            .field("checks", &self.registered_checks())
            .finish()
    }
}

fn run_probe(probe: &(dyn Fn() -> anyhow::Result<bool> + Send + Sync)) -> CheckResult {
    match catch_unwind(AssertUnwindSafe(probe)) {
        Ok(Ok(healthy)) => CheckResult::passed(healthy),
        Ok(Err(error)) => CheckResult::failed(error.to_string()),
        Err(panic) => CheckResult::failed(probe_panic(panic.as_ref())),
    }
}

fn probe_panic(payload: &(dyn std::any::Any + Send)) -> String {
    match panic_message(payload) {
        Some(message) => format!("probe panicked: {}", message),
        None => "probe panicked".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn test_logger(dir: &Path) -> StructuredLogger {
        StructuredLogger::new(
            "health",
            &LoggingConfig {
                dir: dir.to_path_buf(),
                console: false,
                ..LoggingConfig::default()
            },
        )
    }

    fn idle() -> anyhow::Result<SystemUsage> {
        Ok(SystemUsage {
            cpu_percent: 10.0,
            memory_percent: 20.0,
            disk_percent: 30.0,
        })
    }

    #[test]
    fn test_system_probe_runs_first_and_passes() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = HealthMonitor::with_sampler(test_logger(dir.path()), HealthConfig::default(), idle);

        let report = monitor.check_health();
        assert!(report.overall_healthy);
        let system = &report.results[SYSTEM_CHECK];
        assert_eq!(system.usage.unwrap().cpu_percent, 10.0);
    }

    #[test]
    fn test_high_usage_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let busy = || -> anyhow::Result<SystemUsage> {
            Ok(SystemUsage {
                cpu_percent: 95.0,
                memory_percent: 20.0,
                disk_percent: 30.0,
            })
        };
        let monitor = HealthMonitor::with_sampler(test_logger(dir.path()), HealthConfig::default(), busy);

        let report = monitor.check_health();
        assert!(!report.overall_healthy);
        assert!(!report.results[SYSTEM_CHECK].healthy);
        assert!(report.results[SYSTEM_CHECK].error.is_none());
    }

    #[test]
    fn test_failing_probe_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = HealthMonitor::with_sampler(test_logger(dir.path()), HealthConfig::default(), idle);

        monitor.register_health_check("test_check", || Ok(true));
        monitor.register_health_check("failing_check", || Err(anyhow::anyhow!("Test error")));

        let report = monitor.check_health();
        assert!(!report.overall_healthy);
        assert!(report.results["test_check"].healthy);

        let failing = &report.results["failing_check"];
        assert!(!failing.healthy);
        assert_eq!(failing.error.as_deref(), Some("Test error"));
    }

    #[test]
    fn test_panicking_probe_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = HealthMonitor::with_sampler(test_logger(dir.path()), HealthConfig::default(), idle);

        monitor.register_health_check("panics", || panic!("probe exploded"));
        monitor.register_health_check("fine", || Ok(true));

        let report = monitor.check_health();
        assert!(report.results["fine"].healthy);
        assert_eq!(
            report.results["panics"].error.as_deref(),
            Some("probe panicked: probe exploded")
        );
    }

    #[test]
    fn test_sampler_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let broken = || -> anyhow::Result<SystemUsage> { Err(anyhow::anyhow!("no /proc")) };
        let monitor = HealthMonitor::with_sampler(test_logger(dir.path()), HealthConfig::default(), broken);

        let report = monitor.check_health();
        assert_eq!(report.results[SYSTEM_CHECK].error.as_deref(), Some("no /proc"));
        assert!(!report.overall_healthy);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = HealthMonitor::with_sampler(test_logger(dir.path()), HealthConfig::default(), idle);

        monitor.register_health_check("db", || Ok(false));
        monitor.register_health_check("cache", || Ok(true));
        monitor.register_health_check("db", || Ok(true));

        assert_eq!(monitor.registered_checks(), vec!["db", "cache"]);
        assert!(monitor.check_health().overall_healthy);
    }

    #[test]
    fn test_last_check_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let monitor = HealthMonitor::with_sampler(test_logger(dir.path()), HealthConfig::default(), idle);

        let probe_flag = flag.clone();
        monitor.register_health_check("flag", move || Ok(probe_flag.load(Ordering::SeqCst)));

        assert!(monitor.last_check().is_none());
        assert!(monitor.check_health().overall_healthy);

        flag.store(false, Ordering::SeqCst);
        // Memo unchanged until the next evaluation
        assert!(monitor.last_check().unwrap().overall_healthy);
        assert!(!monitor.check_health().overall_healthy);
        assert!(!monitor.last_check().unwrap().overall_healthy);
    }

    #[test]
    fn test_report_serializes_usage_inline() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = HealthMonitor::with_sampler(test_logger(dir.path()), HealthConfig::default(), idle);

        let json = serde_json::to_value(monitor.check_health()).unwrap();
        assert_eq!(json["results"]["system"]["cpu_percent"], 10.0);
        assert_eq!(json["results"]["system"]["healthy"], true);
        assert!(json["results"]["system"].get("error").is_none());
    }
}
