use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use priestess_observability::{
    config::ObservabilityConfig, report, reporter, ObservabilityManager,
};

/// Recent errors shown in the chat preview
const CHAT_RECENT_ERRORS: usize = 5;

/// Execute the status command
pub async fn execute(cfg: ObservabilityConfig, json: bool, chat: bool) -> Result<()> {
    let obs = Arc::new(ObservabilityManager::new(cfg)?);
    let info = reporter::report_now(obs.clone()).await?;
    obs.flush();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    if chat {
        let mut messages = vec![report::render_health(&info)];
        messages.extend(report::render_metrics(&info.metrics));
        messages.push(report::render_recent_errors(
            &info.error_summary,
            CHAT_RECENT_ERRORS,
        ));

        for (i, message) in messages.iter().enumerate() {
            println!("{}", format!("--- message {} ---", i + 1).dimmed());
            println!("{}", message);
        }
        return Ok(());
    }

    println!("{}", "=".repeat(60));
    println!(" {}", "Priestess Bot Status".cyan().bold());
    println!("{}", "=".repeat(60));
    print!("{}", report::render_status(&info));

    Ok(())
}
