//! Terminal UI for the monitoring dashboard
//!
//! Renders the latest [`SystemInfo`] snapshot: overall status, health
//! checks, uptime, counters, command latencies and recent errors.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::health::SYSTEM_CHECK;
use crate::logging::format::TIMESTAMP_FORMAT;
use crate::manager::SystemInfo;

/// What a key press asks the dashboard loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Refresh,
    None,
}

/// Application state for the dashboard
pub struct DashboardApp {
    pub info: Option<SystemInfo>,
    pub last_update: Option<DateTime<Local>>,
    pub error_message: Option<String>,
    pub interval_secs: u64,
}

impl DashboardApp {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            info: None,
            last_update: None,
            error_message: None,
            interval_secs,
        }
    }

    pub fn update(&mut self, info: SystemInfo) {
        self.info = Some(info);
        self.last_update = Some(Local::now());
        self.error_message = None;
    }

    pub fn handle_key(&self, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Refresh,
            _ => KeyAction::None,
        }
    }

    pub fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(8),    // Health + system / metrics
                Constraint::Length(8), // Errors
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(chunks[1]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(5)])
            .split(body[0]);
        self.render_health(f, left[0]);
        self.render_system(f, left[1]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(body[1]);
        self.render_counters(f, right[0]);
        self.render_performance(f, right[1]);

        self.render_errors(f, chunks[2]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let (status, color) = match &self.info {
            Some(info) if info.health_status.overall_healthy => ("HEALTHY", Color::Green),
            Some(_) => ("UNHEALTHY", Color::Red),
            None => ("UNKNOWN", Color::Yellow),
        };

        let last_update = self
            .last_update
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "Never".to_string());

        let title = vec![
            Line::from(vec![
                Span::styled(
                    "Priestess Bot Monitor",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  |  Status: "),
                Span::styled(status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw("  |  Last update: "),
                Span::styled(last_update, Style::default().fg(Color::Green)),
            ]),
            Line::from(Span::styled(
                format!(
                    "Press 'q' to quit | 'r' to refresh | refreshing every {}s",
                    self.interval_secs
                ),
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let paragraph = Paragraph::new(title).block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_health(&self, f: &mut Frame, area: Rect) {
        let mut lines = Vec::new();

        if let Some(info) = &self.info {
            for (name, result) in &info.health_status.results {
                let (mark, color) = if result.healthy {
                    ("✓", Color::Green)
                } else {
                    ("✗", Color::Red)
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{} ", mark), Style::default().fg(color)),
                    Span::raw(name.clone()),
                ]));

                if name == SYSTEM_CHECK {
                    if let Some(usage) = &result.usage {
                        lines.push(Line::from(format!(
                            "    CPU {:.1}%  Mem {:.1}%  Disk {:.1}%",
                            usage.cpu_percent, usage.memory_percent, usage.disk_percent
                        )));
                    }
                }
                if let Some(error) = &result.error {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", error),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
        }

        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Health Checks"));
        f.render_widget(paragraph, area);
    }

    fn render_system(&self, f: &mut Frame, area: Rect) {
        let lines = match &self.info {
            Some(info) => vec![
                Line::from(format!("Uptime: {}", info.uptime_formatted)),
                Line::from(format!(
                    "Started: {}",
                    info.start_time.format(TIMESTAMP_FORMAT)
                )),
                Line::from(format!(
                    "Bot ready: {}",
                    if info.bot_ready { "Yes" } else { "No" }
                )),
            ],
            None => vec![Line::from("No snapshot yet")],
        };

        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("System"));
        f.render_widget(paragraph, area);
    }

    fn render_counters(&self, f: &mut Frame, area: Rect) {
        let header = Row::new(["Counter", "Value"].into_iter().map(header_cell)).bottom_margin(1);

        let rows: Vec<Row> = match &self.info {
            Some(info) if !info.metrics.counters.is_empty() => info
                .metrics
                .counters
                .iter()
                .map(|(key, value)| {
                    Row::new(vec![Cell::from(key.clone()), Cell::from(format_number(*value))])
                })
                .collect(),
            _ => vec![Row::new(vec![Cell::from("No counters recorded yet")])],
        };

        let table = Table::new(rows, [Constraint::Percentage(80), Constraint::Percentage(20)])
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Counters"))
            .column_spacing(1);
        f.render_widget(table, area);
    }

    fn render_performance(&self, f: &mut Frame, area: Rect) {
        let header = Row::new(
            ["Histogram", "Count", "Avg (ms)", "P95/P99 (ms)", "Max (ms)"]
                .into_iter()
                .map(header_cell),
        )
        .bottom_margin(1);

        let rows: Vec<Row> = match &self.info {
            Some(info) if !info.metrics.histograms.is_empty() => info
                .metrics
                .histograms
                .iter()
                .map(|(key, stats)| {
                    Row::new(vec![
                        Cell::from(key.clone()),
                        Cell::from(stats.count.to_string()),
                        Cell::from(format_ms(stats.avg)),
                        Cell::from(format!("{}/{}", format_ms(stats.p95), format_ms(stats.p99))),
                        Cell::from(format_ms(stats.max)),
                    ])
                })
                .collect(),
            _ => vec![Row::new(vec![Cell::from("No timings recorded yet")])],
        };

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(40),
                Constraint::Percentage(12),
                Constraint::Percentage(14),
                Constraint::Percentage(20),
                Constraint::Percentage(14),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Performance"))
        .column_spacing(1);
        f.render_widget(table, area);
    }

    fn render_errors(&self, f: &mut Frame, area: Rect) {
        let content = if let Some(error) = &self.error_message {
            vec![
                Line::from(Span::styled(
                    format!("Error: {}", error),
                    Style::default().fg(Color::Red),
                )),
                Line::from(Span::styled(
                    "(retrying on next interval...)",
                    Style::default().fg(Color::Yellow),
                )),
            ]
        } else if let Some(info) = &self.info {
            let summary = &info.error_summary;
            let mut lines = vec![Line::from(vec![
                Span::styled("Total errors: ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    summary.total_errors.to_string(),
                    if summary.total_errors > 0 {
                        Style::default().fg(Color::Red)
                    } else {
                        Style::default().fg(Color::Green)
                    },
                ),
            ])];

            let skip = summary.recent_errors.len().saturating_sub(5);
            for error in summary.recent_errors[skip..].iter().rev() {
                lines.push(Line::from(format!(
                    "{} - {}: {}",
                    error.timestamp.format(TIMESTAMP_FORMAT),
                    error.kind,
                    error.message
                )));
            }
            lines
        } else {
            vec![Line::from(Span::styled(
                "Waiting for first snapshot...",
                Style::default().fg(Color::Yellow),
            ))]
        };

        let paragraph =
            Paragraph::new(content).block(Block::default().borders(Borders::ALL).title("Recent Errors"));
        f.render_widget(paragraph, area);
    }
}

fn header_cell(title: &'static str) -> Cell<'static> {
    Cell::from(title).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

/// Format number with thousand separators
fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut result = String::new();
    let len = digits.len();

    if n < 0 {
        result.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Seconds rendered as whole milliseconds
fn format_ms(seconds: f64) -> String {
    format!("{:.0}", seconds * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-1234), "-1,234");
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(0.1234), "123");
        assert_eq!(format_ms(0.0), "0");
    }

    #[test]
    fn test_key_actions() {
        let app = DashboardApp::new(30);
        let key = |c| KeyEvent::new(c, KeyModifiers::NONE);
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), KeyAction::Quit);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), KeyAction::Quit);
        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), KeyAction::Refresh);
        assert_eq!(app.handle_key(key(KeyCode::Char('x'))), KeyAction::None);
    }

    #[test]
    fn test_render_without_snapshot() {
        let app = DashboardApp::new(30);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("UNKNOWN"));
        assert!(text.contains("Waiting for first snapshot"));
    }
}
