use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::Level;

/// Default configuration file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "observability.toml";

/// Environment variable prefix (`PRIESTESS__HEALTH__CPU_THRESHOLD=75`)
pub const ENV_PREFIX: &str = "PRIESTESS";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory holding `bot.log` and `errors.log`
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// Minimum level accepted by structured loggers
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write info+ records to stderr
    #[serde(default = "default_console")]
    pub console: bool,

    /// Rotate a log file once it would grow past this many bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Rotated files kept next to the active one
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    #[serde(default = "default_cpu_threshold")]
    pub cpu_threshold: f64,
    #[serde(default = "default_memory_threshold")]
    pub memory_threshold: f64,
    #[serde(default = "default_disk_threshold")]
    pub disk_threshold: f64,

    /// Path whose filesystem is measured for disk usage
    #[serde(default = "default_disk_path")]
    pub disk_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PerformanceConfig {
    /// Seconds after which an operation is logged as slow
    #[serde(default = "default_slow_threshold")]
    pub slow_threshold: f64,

    /// Seconds after which an operation is logged as critical
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportingConfig {
    /// Periodic status report interval, 0 disables the reporter
    #[serde(default)]
    pub interval_secs: u64,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_console() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_backup_count() -> usize {
    5
}

fn default_cpu_threshold() -> f64 {
    80.0
}

fn default_memory_threshold() -> f64 {
    85.0
}

fn default_disk_threshold() -> f64 {
    90.0
}

fn default_disk_path() -> PathBuf {
    PathBuf::from("/")
}

fn default_slow_threshold() -> f64 {
    1.0
}

fn default_critical_threshold() -> f64 {
    5.0
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
            console: default_console(),
            max_file_size: default_max_file_size(),
            backup_count: default_backup_count(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: default_cpu_threshold(),
            memory_threshold: default_memory_threshold(),
            disk_threshold: default_disk_threshold(),
            disk_path: default_disk_path(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            slow_threshold: default_slow_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

impl LoggingConfig {
    /// Parsed logger threshold; falls back to debug for unvalidated input
    pub fn level(&self) -> Level {
        self.level.parse().unwrap_or(Level::Debug)
    }
}

/// Load configuration from an optional TOML file plus `PRIESTESS__*` env vars
///
/// A missing file is not an error: every field has a default. The result is
/// validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<ObservabilityConfig, ConfigError> {
    let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let config = config::Config::builder()
        .add_source(config::File::from(file).required(path.is_some()))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let cfg: ObservabilityConfig = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

/// Check value ranges, collecting every problem before failing
pub fn validate_config(cfg: &ObservabilityConfig) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    let ranges = [
        ("health.cpu_threshold", cfg.health.cpu_threshold, 0.0, 100.0),
        ("health.memory_threshold", cfg.health.memory_threshold, 0.0, 100.0),
        ("health.disk_threshold", cfg.health.disk_threshold, 0.0, 100.0),
        ("performance.slow_threshold", cfg.performance.slow_threshold, 0.0, 60.0),
        ("performance.critical_threshold", cfg.performance.critical_threshold, 0.0, 300.0),
    ];

    for (name, value, min, max) in ranges {
        // NaN is outside every range
        if !(min..=max).contains(&value) {
            problems.push(format!(
                "Configuration '{}' must be between {} and {}, got {}",
                name, min, max, value
            ));
        }
    }

    if cfg.performance.slow_threshold > cfg.performance.critical_threshold {
        problems.push(format!(
            "performance.slow_threshold ({}) must not exceed performance.critical_threshold ({})",
            cfg.performance.slow_threshold, cfg.performance.critical_threshold
        ));
    }

    if cfg.logging.level.parse::<Level>().is_err() {
        problems.push(format!(
            "Invalid log level '{}'. Must be one of: debug, info, warning, error, critical",
            cfg.logging.level
        ));
    }

    if cfg.logging.max_file_size == 0 {
        problems.push("logging.max_file_size must be greater than 0".to_string());
    }

    if cfg.logging.dir.as_os_str().is_empty() {
        problems.push("logging.dir cannot be empty".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(problems))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ObservabilityConfig::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.health.cpu_threshold, 80.0);
        assert_eq!(cfg.health.memory_threshold, 85.0);
        assert_eq!(cfg.health.disk_threshold, 90.0);
        assert_eq!(cfg.performance.slow_threshold, 1.0);
        assert_eq!(cfg.performance.critical_threshold, 5.0);
        assert_eq!(cfg.logging.max_file_size, 10 * 1024 * 1024);
        assert_eq!(cfg.logging.backup_count, 5);
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let mut cfg = ObservabilityConfig::default();
        cfg.health.cpu_threshold = 120.0;
        cfg.health.disk_threshold = -1.0;
        cfg.logging.level = "verbose".to_string();

        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(problems) => {
                assert_eq!(problems.len(), 3);
                assert!(problems[0].contains("health.cpu_threshold"));
                assert!(problems[1].contains("health.disk_threshold"));
                assert!(problems[2].contains("verbose"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_slow_above_critical() {
        let mut cfg = ObservabilityConfig::default();
        cfg.performance.slow_threshold = 10.0;
        cfg.performance.critical_threshold = 2.0;

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must not exceed"));
    }

    #[test]
    fn test_validate_rejects_nan_threshold() {
        let mut cfg = ObservabilityConfig::default();
        cfg.health.memory_threshold = f64::NAN;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[logging]
dir = "/tmp/priestess-logs"
console = false

[health]
cpu_threshold = 70.0
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.logging.dir, PathBuf::from("/tmp/priestess-logs"));
        assert!(!cfg.logging.console);
        assert_eq!(cfg.health.cpu_threshold, 70.0);
        // Untouched sections keep their defaults
        assert_eq!(cfg.health.memory_threshold, 85.0);
        assert_eq!(cfg.performance.critical_threshold, 5.0);
    }

    #[test]
    fn test_load_config_invalid_file_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[health]\ndisk_threshold = 150.0").unwrap();

        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_config_missing_explicit_file_fails() {
        let result = load_config(Some(Path::new("/nonexistent/observability.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
