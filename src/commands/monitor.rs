//! Monitor command implementation
//!
//! Runs the terminal dashboard, refreshing a [`SystemInfo`] snapshot every
//! interval.

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::FutureExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};
use tokio::time::interval;

use priestess_observability::{
    config::ObservabilityConfig,
    dashboard::{DashboardApp, KeyAction},
    reporter, ObservabilityManager,
};

/// Execute the monitor command
pub async fn execute(cfg: ObservabilityConfig, interval_secs: u64) -> Result<()> {
    if !(1..=3600).contains(&interval_secs) {
        anyhow::bail!(
            "Invalid interval: {}. Must be between 1 and 3600 seconds",
            interval_secs
        );
    }

    let report_every = cfg.reporting.interval_secs;
    let obs = Arc::new(ObservabilityManager::new(cfg)?);

    let report_task = (report_every > 0)
        .then(|| reporter::spawn_report_task(obs.clone(), Duration::from_secs(report_every)));

    let result = run_dashboard(obs.clone(), interval_secs).await;

    if let Some(handle) = report_task {
        handle.abort();
    }
    obs.flush();
    result
}

async fn run_dashboard(obs: Arc<ObservabilityManager>, interval_secs: u64) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = DashboardApp::new(interval_secs);
    let mut refresh_timer = interval(Duration::from_secs(interval_secs));

    // First tick completes immediately and triggers the initial fetch
    let result = loop {
        if refresh_timer.tick().now_or_never().is_some() {
            refresh(&mut app, &obs).await;
        }

        if let Err(e) = terminal.draw(|f| app.render(f)) {
            break Err(e.into());
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match app.handle_key(key) {
                    KeyAction::Quit => break Ok(()),
                    KeyAction::Refresh => refresh(&mut app, &obs).await,
                    KeyAction::None => {}
                }
            }
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn refresh(app: &mut DashboardApp, obs: &Arc<ObservabilityManager>) {
    match reporter::report_now(obs.clone()).await {
        Ok(info) => app.update(info),
        Err(e) => app.error_message = Some(format!("Snapshot error: {}", e)),
    }
}
