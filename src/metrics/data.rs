//! Data structures for host metrics.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One timestamped set of host performance measurements.
///
/// This is also the wire shape: the channel carries one of these per line and
/// `GET /metrics` returns it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Seconds since the Unix epoch at build time
    pub timestamp: f64,
    /// CPU utilization over the sampling window (0.0 to 100.0)
    pub cpu_percent: f64,
    /// Physical memory in use (0.0 to 100.0)
    pub memory_percent: f64,
    /// Bytes read plus written since the previous sample
    pub disk_io_bytes: u64,
    /// Bytes sent plus received since the previous sample
    pub net_io_bytes: u64,
    /// 1-minute load average
    pub load_avg: f64,
}

/// A cumulative counter pair as reported by the OS.
///
/// For disks this is `(read_bytes, write_bytes)`, for networks
/// `(bytes_sent, bytes_received)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    pub first: u64,
    pub second: u64,
}

impl IoCounters {
    pub fn new(first: u64, second: u64) -> Self {
        Self { first, second }
    }

    /// Combined cumulative byte count.
    pub fn total(&self) -> u64 {
        self.first.saturating_add(self.second)
    }
}

/// Everything read from the OS during one sampling pass, before deltas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReading {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk: IoCounters,
    pub net: IoCounters,
    pub load_avg: f64,
}

/// Current wall-clock time as fractional seconds since the epoch.
pub fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
