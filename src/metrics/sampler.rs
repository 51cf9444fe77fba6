//! Host counter sampling using sysinfo and direct /proc access.

use crate::error::{PulseError, Result};
use crate::metrics::{
    data::{IoCounters, RawReading},
    traits::CounterSource,
};
use std::time::Duration;
use sysinfo::{Networks, System};
use tokio::time;

/// Sector size the kernel uses for `/proc/diskstats`, independent of the device.
const DISKSTATS_SECTOR_BYTES: u64 = 512;

/// Samples the local host.
pub struct HostSampler {
    system: System,
    networks: Networks,
    cpu_window: Duration,
}

impl HostSampler {
    /// Create a sampler that observes CPU usage over `cpu_window`.
    ///
    /// Windows shorter than sysinfo's minimum update interval are raised to it.
    pub fn new(cpu_window: Duration) -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            system,
            networks: Networks::new_with_refreshed_list(),
            cpu_window: cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    /// The effective CPU observation window.
    pub fn cpu_window(&self) -> Duration {
        self.cpu_window
    }

    async fn read_cpu_percent(&mut self) -> f64 {
        self.system.refresh_cpu_usage();
        time::sleep(self.cpu_window).await;
        self.system.refresh_cpu_usage();
        f64::from(self.system.global_cpu_usage())
    }

    fn read_memory_percent(&mut self) -> Result<f64> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(PulseError::sampling_error("total memory reported as zero"));
        }
        Ok(self.system.used_memory() as f64 / total as f64 * 100.0)
    }

    fn read_net_counters(&mut self) -> IoCounters {
        self.networks.refresh_list();
        self.networks.refresh();
        self.networks
            .iter()
            .fold(IoCounters::default(), |acc, (_, data)| IoCounters {
                first: acc.first.saturating_add(data.total_transmitted()),
                second: acc.second.saturating_add(data.total_received()),
            })
    }

    #[cfg(target_os = "linux")]
    fn read_disk_counters(&self) -> Result<IoCounters> {
        let content = std::fs::read_to_string("/proc/diskstats")?;
        parse_diskstats(&content, is_whole_disk)
    }

    #[cfg(not(target_os = "linux"))]
    fn read_disk_counters(&self) -> Result<IoCounters> {
        Ok(IoCounters::default())
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::DEFAULT_CPU_WINDOW_MS))
    }
}

impl CounterSource for HostSampler {
    async fn read(&mut self) -> Result<RawReading> {
        let cpu_percent = self.read_cpu_percent().await;
        let memory_percent = self.read_memory_percent()?;
        let disk = self.read_disk_counters()?;
        let net = self.read_net_counters();
        let load_avg = System::load_average().one;

        Ok(RawReading {
            cpu_percent,
            memory_percent,
            disk,
            net,
            load_avg,
        })
    }
}

/// Whether a diskstats entry is a whole physical device rather than a
/// partition or a virtual loop/ram device.
#[cfg(target_os = "linux")]
fn is_whole_disk(name: &str) -> bool {
    if name.starts_with("loop") || name.starts_with("ram") {
        return false;
    }
    std::path::Path::new("/sys/block").join(name).exists()
}

/// Sum read and written bytes over the `/proc/diskstats` entries accepted by `is_disk`.
///
/// Columns: major, minor, name, reads completed, reads merged, sectors read,
/// ms reading, writes completed, writes merged, sectors written, ...
pub fn parse_diskstats(content: &str, is_disk: impl Fn(&str) -> bool) -> Result<IoCounters> {
    let mut counters = IoCounters::default();

    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 10 {
            return Err(PulseError::parse_error(format!(
                "short diskstats line: {:?}",
                line
            )));
        }
        if !is_disk(fields[2]) {
            continue;
        }

        let sectors = |idx: usize| -> Result<u64> {
            fields[idx].parse::<u64>().map_err(|e| {
                PulseError::parse_error(format!("diskstats column {} of {}: {}", idx, fields[2], e))
            })
        };
        let read = sectors(5)?.saturating_mul(DISKSTATS_SECTOR_BYTES);
        let written = sectors(9)?.saturating_mul(DISKSTATS_SECTOR_BYTES);

        counters.first = counters.first.saturating_add(read);
        counters.second = counters.second.saturating_add(written);
    }

    Ok(counters)
}
