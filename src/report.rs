//! Text renderings of observability snapshots
//!
//! Chat-sized messages for the health, metrics and logs commands (capped at
//! [`MESSAGE_LIMIT`] characters) and the plain-text status report printed by
//! the CLI.

use std::fmt::Write as _;
use std::time::Duration;

use crate::error_tracker::ErrorSummary;
use crate::health::{HealthReport, SYSTEM_CHECK};
use crate::logging::format::TIMESTAMP_FORMAT;
use crate::manager::SystemInfo;
use crate::metrics::MetricsSnapshot;

/// Longest message a chat channel accepts
pub const MESSAGE_LIMIT: usize = 2000;

/// Length kept when a message has to be cut
const TRUNCATED_LENGTH: usize = 1900;

/// `{days}d {hours}h {minutes}m`
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    format!("{}d {}h {}m", days, hours, minutes)
}

/// Cut a message over [`MESSAGE_LIMIT`] characters down and append `...`
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MESSAGE_LIMIT {
        return message.to_string();
    }
    let mut cut: String = message.chars().take(TRUNCATED_LENGTH).collect();
    cut.push_str("...");
    cut
}

fn mark(healthy: bool) -> &'static str {
    if healthy {
        "✅"
    } else {
        "❌"
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Health command message
pub fn render_health(info: &SystemInfo) -> String {
    let health = &info.health_status;
    let mut out = String::new();

    let _ = writeln!(out, "{} **Bot Health Status**\n", mark(health.overall_healthy));
    let _ = writeln!(out, "**System Information:**");
    let _ = writeln!(out, "• Uptime: {}", info.uptime_formatted);
    let _ = writeln!(out, "• Bot Ready: {}", yes_no(info.bot_ready));

    let _ = writeln!(out, "\n**Health Checks:**");
    for (name, result) in &health.results {
        let _ = writeln!(out, "• {}: {}", name, mark(result.healthy));
        if let Some(error) = &result.error {
            let _ = writeln!(out, "  Error: {}", error);
        }
        if let Some(usage) = &result.usage {
            let _ = writeln!(out, "  CPU: {:.1}%", usage.cpu_percent);
            let _ = writeln!(out, "  Memory: {:.1}%", usage.memory_percent);
            let _ = writeln!(out, "  Disk: {:.1}%", usage.disk_percent);
        }
    }

    if !info.metrics.counters.is_empty() {
        let _ = writeln!(out, "\n**Key Metrics:**");
        for (metric, count) in info.metrics.counters.iter().take(5) {
            let _ = writeln!(out, "• {}: {}", metric, count);
        }
    }

    let errors = &info.error_summary;
    if errors.total_errors > 0 {
        let _ = writeln!(out, "\n**Errors:** {} total", errors.total_errors);
        for (kind, count) in errors.error_counts.iter().take(3) {
            let _ = writeln!(out, "• {}: {}", kind, count);
        }
    }

    truncate_message(&out)
}

/// Metrics command messages
///
/// One message normally; when the rendering is over the limit, the cut
/// rendering followed by the raw snapshot as JSON.
pub fn render_metrics(metrics: &MetricsSnapshot) -> Vec<String> {
    let mut out = String::from("**📊 Bot Metrics**\n\n");

    if !metrics.counters.is_empty() {
        out.push_str("**Counters:**\n");
        for (metric, count) in &metrics.counters {
            let _ = writeln!(out, "• {}: {}", metric, count);
        }
        out.push('\n');
    }

    if !metrics.gauges.is_empty() {
        out.push_str("**Gauges:**\n");
        for (metric, value) in &metrics.gauges {
            let _ = writeln!(out, "• {}: {}", metric, value);
        }
        out.push('\n');
    }

    if !metrics.histograms.is_empty() {
        out.push_str("**Performance Metrics:**\n");
        for (metric, stats) in metrics.histograms.iter().filter(|(_, s)| s.count > 0) {
            let _ = writeln!(out, "• {}:", metric);
            let _ = writeln!(out, "  - Count: {}", stats.count);
            let _ = writeln!(out, "  - Avg: {:.3}s", stats.avg);
            let _ = writeln!(out, "  - P95: {:.3}s", stats.p95);
            let _ = writeln!(out, "  - Max: {:.3}s", stats.max);
        }
    }

    if out.chars().count() <= MESSAGE_LIMIT {
        return vec![out];
    }

    let raw = serde_json::to_string_pretty(metrics).unwrap_or_else(|e| e.to_string());
    vec![
        truncate_message(&out),
        format!("**Raw Metrics:**\n```json\n{}\n```", truncate_message(&raw)),
    ]
}

/// Logs command message: the latest `limit` errors, oldest first
pub fn render_recent_errors(summary: &ErrorSummary, limit: usize) -> String {
    let recent = &summary.recent_errors;
    if recent.is_empty() {
        return "No recent errors. ✅".to_string();
    }

    let shown = limit.min(recent.len());
    let mut out = format!("**🚨 Recent Errors (Last {}):**\n\n", shown);

    for error in &recent[recent.len() - shown..] {
        let _ = writeln!(
            out,
            "**{}** - {}",
            error.kind,
            error.timestamp.format(TIMESTAMP_FORMAT)
        );
        let _ = writeln!(out, "Message: {}", preview(&error.message, 100));
        if !error.context.is_empty() {
            let context = error
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "Context: {}", context);
        }
        out.push('\n');
    }

    truncate_message(&out)
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}

fn render_health_block(out: &mut String, health: &HealthReport) {
    let status = if health.overall_healthy {
        "HEALTHY"
    } else {
        "UNHEALTHY"
    };
    let _ = writeln!(out, "Overall Status: {}", status);

    for (name, result) in &health.results {
        let _ = writeln!(out, "  {} {}", mark(result.healthy), name);
        if name == SYSTEM_CHECK {
            if let Some(usage) = &result.usage {
                let _ = writeln!(out, "    CPU: {:.1}%", usage.cpu_percent);
                let _ = writeln!(out, "    Memory: {:.1}%", usage.memory_percent);
                let _ = writeln!(out, "    Disk: {:.1}%", usage.disk_percent);
            }
        }
        if let Some(error) = &result.error {
            let _ = writeln!(out, "    Error: {}", error);
        }
    }
}

/// Plain-text status report
pub fn render_status(info: &SystemInfo) -> String {
    let mut out = String::new();

    render_health_block(&mut out, &info.health_status);

    let _ = writeln!(out, "\n--- System Information ---");
    let _ = writeln!(out, "Uptime: {}", info.uptime_formatted);
    let _ = writeln!(out, "Start Time: {}", info.start_time.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "Bot Ready: {}", yes_no(info.bot_ready));

    let _ = writeln!(out, "\n--- Key Metrics ---");
    if !info.metrics.counters.is_empty() {
        let _ = writeln!(out, "Counters:");
        for (metric, count) in &info.metrics.counters {
            let _ = writeln!(out, "  {}: {}", metric, count);
        }
    }
    let timed: Vec<_> = info
        .metrics
        .histograms
        .iter()
        .filter(|(_, stats)| stats.count > 0)
        .collect();
    if !timed.is_empty() {
        let _ = writeln!(out, "\nPerformance (Average Response Times):");
        for (metric, stats) in timed {
            let _ = writeln!(out, "  {}: {:.3}s (P95: {:.3}s)", metric, stats.avg, stats.p95);
        }
    }

    let errors = &info.error_summary;
    let _ = writeln!(out, "\n--- Error Summary ---");
    let _ = writeln!(out, "Total Errors: {}", errors.total_errors);
    if !errors.error_counts.is_empty() {
        let _ = writeln!(out, "Error Types:");
        let mut by_count: Vec<_> = errors.error_counts.iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in by_count {
            let _ = writeln!(out, "  {}: {}", kind, count);
        }
    }
    if !errors.recent_errors.is_empty() {
        let _ = writeln!(out, "\nRecent Errors (Last 5):");
        let skip = errors.recent_errors.len().saturating_sub(5);
        for error in &errors.recent_errors[skip..] {
            let _ = writeln!(
                out,
                "  {} - {}: {}",
                error.timestamp.format(TIMESTAMP_FORMAT),
                error.kind,
                preview(&error.message, 50)
            );
        }
    }

    out
}
