use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tracing::info;

use priestess_observability::config::{self, ObservabilityConfig, DEFAULT_CONFIG_FILE};

/// Execute the config show command
///
/// Displays the effective configuration (file, env overrides and defaults)
pub fn show(path: Option<&Path>) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!("Loading configuration for display");

    let cfg = config::load_config(path)?;

    println!("{} ({})", "Current Configuration:".green().bold(), source_name(path));
    println!();

    let toml_string = toml::to_string_pretty(&cfg)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
pub fn validate(path: Option<&Path>) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!("Validating configuration file");

    let cfg = match config::load_config(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}", "✗ Configuration is invalid".red());
            return Err(e.into());
        }
    };

    println!("{}", "✓ Configuration is valid".green());
    println!();
    print_summary(&cfg);

    Ok(())
}

fn source_name(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => DEFAULT_CONFIG_FILE.to_string(),
        None => "defaults".to_string(),
    }
}

fn print_summary(cfg: &ObservabilityConfig) {
    println!("{}", "Summary:".bold());
    println!(
        "  {}: {} (level {}, console {})",
        "Log Directory".cyan(),
        cfg.logging.dir.display(),
        cfg.logging.level,
        if cfg.logging.console { "on" } else { "off" }
    );
    println!(
        "  {}: {} bytes x {} backups",
        "Log Rotation".cyan(),
        cfg.logging.max_file_size,
        cfg.logging.backup_count
    );
    println!(
        "  {}: cpu {}% / memory {}% / disk {}% on {}",
        "Health Thresholds".cyan(),
        cfg.health.cpu_threshold,
        cfg.health.memory_threshold,
        cfg.health.disk_threshold,
        cfg.health.disk_path.display()
    );
    println!(
        "  {}: slow {}s / critical {}s",
        "Performance".cyan(),
        cfg.performance.slow_threshold,
        cfg.performance.critical_threshold
    );
    println!(
        "  {}: {}",
        "Status Reports".cyan(),
        match cfg.reporting.interval_secs {
            0 => "disabled".to_string(),
            secs => format!("every {}s", secs),
        }
    );
}
