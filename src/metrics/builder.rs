//! Turns raw readings into timestamped snapshots.

use crate::metrics::data::{unix_seconds, IoCounters, RawReading, Snapshot};
use tracing::warn;

/// Smallest step used to keep timestamps strictly increasing.
const TIMESTAMP_EPSILON: f64 = 1e-6;

/// Owns the previous cumulative counters and derives deltas from them.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    prev_disk: IoCounters,
    prev_net: IoCounters,
    last_timestamp: Option<f64>,
}

impl SnapshotBuilder {
    /// Start from `baseline`; the first built snapshot reports activity since it.
    pub fn new(baseline: &RawReading) -> Self {
        Self {
            prev_disk: baseline.disk,
            prev_net: baseline.net,
            last_timestamp: None,
        }
    }

    /// Build a snapshot stamped with the current wall-clock time.
    pub fn build(&mut self, reading: &RawReading) -> Snapshot {
        self.build_at(reading, unix_seconds())
    }

    /// Build a snapshot stamped with `timestamp`.
    ///
    /// The stored counters are replaced by `reading` before returning, so the
    /// next call measures from here whatever happens to this snapshot.
    pub fn build_at(&mut self, reading: &RawReading, timestamp: f64) -> Snapshot {
        let disk_io_bytes = counter_delta("disk", self.prev_disk, reading.disk);
        let net_io_bytes = counter_delta("network", self.prev_net, reading.net);
        self.prev_disk = reading.disk;
        self.prev_net = reading.net;

        let timestamp = match self.last_timestamp {
            Some(last) if timestamp <= last => last + TIMESTAMP_EPSILON,
            _ => timestamp,
        };
        self.last_timestamp = Some(timestamp);

        Snapshot {
            timestamp,
            cpu_percent: reading.cpu_percent,
            memory_percent: reading.memory_percent,
            disk_io_bytes,
            net_io_bytes,
            load_avg: reading.load_avg,
        }
    }
}

/// Delta between two cumulative totals.
///
/// A total that went backwards (reboot, driver reset, wraparound) has no
/// meaningful delta: report zero and let the caller resync on the new value.
fn counter_delta(name: &str, prev: IoCounters, cur: IoCounters) -> u64 {
    let (prev, cur) = (prev.total(), cur.total());
    match cur.checked_sub(prev) {
        Some(delta) => delta,
        None => {
            warn!(
                "{} counter decreased from {} to {}, resyncing baseline",
                name, prev, cur
            );
            0
        }
    }
}
