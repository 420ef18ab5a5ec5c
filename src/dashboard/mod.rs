//! Terminal monitoring dashboard

pub mod ui;

pub use ui::{DashboardApp, KeyAction};
