//! Command implementations for the CLI
//!
//! - check: exercise every observability component once
//! - status: one-shot status report
//! - monitor: live terminal dashboard
//! - config: configuration display and validation

pub mod check;
pub mod config;
pub mod monitor;
pub mod status;
