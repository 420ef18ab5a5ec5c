//! Host resource sampling for the built-in system probe

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::config::HealthConfig;

/// CPU, memory and disk utilization in percent (0-100)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SystemUsage {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
}

impl SystemUsage {
    /// Every resource strictly below its threshold
    pub fn within(&self, thresholds: &HealthConfig) -> bool {
        self.cpu_percent < thresholds.cpu_threshold
            && self.memory_percent < thresholds.memory_threshold
            && self.disk_percent < thresholds.disk_threshold
    }
}

/// Source of [`SystemUsage`] samples
pub trait SystemSampler: Send + Sync {
    fn sample(&self) -> Result<SystemUsage>;
}

impl<F> SystemSampler for F
where
    F: Fn() -> Result<SystemUsage> + Send + Sync,
{
    fn sample(&self) -> Result<SystemUsage> {
        self()
    }
}

/// Sampler backed by `sysinfo`
///
/// CPU usage needs two refreshes apart, so every sample blocks for
/// [`MINIMUM_CPU_UPDATE_INTERVAL`].
pub struct SysinfoSampler {
    system: Mutex<System>,
    disk_path: PathBuf,
}

impl SysinfoSampler {
    pub fn new(disk_path: impl Into<PathBuf>) -> Self {
        Self {
            system: Mutex::new(System::new()),
            disk_path: disk_path.into(),
        }
    }

    fn cpu_percent(system: &mut System) -> f64 {
        system.refresh_cpu_usage();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_usage();
        f64::from(system.global_cpu_usage())
    }

    fn memory_percent(system: &mut System) -> Result<f64> {
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return Err(anyhow!("total memory reported as zero"));
        }
        Ok(system.used_memory() as f64 / total as f64 * 100.0)
    }

    fn disk_percent(&self) -> Result<f64> {
        let disks = Disks::new_with_refreshed_list();

        // The disk whose mount point is the longest prefix of the path
        let disk = disks
            .list()
            .iter()
            .filter(|disk| self.disk_path.starts_with(disk.mount_point()))
            .max_by_key(|disk| mount_depth(disk.mount_point()))
            .ok_or_else(|| anyhow!("no disk mounted at {}", self.disk_path.display()))?;

        let total = disk.total_space();
        if total == 0 {
            return Err(anyhow!(
                "disk at {} reports zero capacity",
                disk.mount_point().display()
            ));
        }
        let used = total.saturating_sub(disk.available_space());
        Ok(used as f64 / total as f64 * 100.0)
    }
}

fn mount_depth(path: &Path) -> usize {
    path.components().count()
}

impl SystemSampler for SysinfoSampler {
    fn sample(&self) -> Result<SystemUsage> {
        let mut system = self.system.lock();
        let cpu_percent = Self::cpu_percent(&mut system);
        let memory_percent = Self::memory_percent(&mut system)?;
        drop(system);

        Ok(SystemUsage {
            cpu_percent,
            memory_percent,
            disk_percent: self.disk_percent()?,
        })
    }
}
