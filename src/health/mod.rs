//! Health checks
//!
//! A built-in system probe (CPU, memory, disk against configured thresholds)
//! plus any number of named probes. Every evaluation is on demand; a probe
//! that errors or panics counts as unhealthy instead of failing the check.

pub mod monitor;
pub mod system;

pub use monitor::{CheckResult, HealthMonitor, HealthProbe, HealthReport, SYSTEM_CHECK};
pub use system::{SysinfoSampler, SystemSampler, SystemUsage};
