//! Hand-off between the collector and the snapshot server.
//!
//! A channel is a single slot holding the newest published [`Snapshot`].
//! Two transports exist: [`FileChannel`] for a collector and server running as
//! separate processes, and [`MemoryChannel`] when both run in one process.
//!
//! Reads never consume the slot: two reads with no publish in between return
//! the same snapshot.

pub mod file;
pub mod memory;

pub use file::{ChannelGuard, FileChannel};
pub use memory::MemoryChannel;

use crate::metrics::Snapshot;
use async_trait::async_trait;
use std::path::PathBuf;

/// Message returned to clients while the slot is still empty.
pub const NO_DATA_MESSAGE: &str = "No data available from collector";

/// Failures while publishing to or reading from a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel file does not exist; no collector has created it.
    #[error("Metrics channel not found at {}", .path.display())]
    Absent { path: PathBuf },

    /// The channel exists but nothing has been published to it yet.
    #[error("{}", NO_DATA_MESSAGE)]
    NoData,

    /// The newest record is not a valid snapshot encoding.
    #[error("Malformed snapshot record: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A snapshot could not be encoded.
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Single-writer, many-reader slot for the latest snapshot.
#[async_trait]
pub trait SnapshotChannel: Send + Sync {
    /// Replace the slot contents with `snapshot`.
    async fn publish(&self, snapshot: &Snapshot) -> Result<(), ChannelError>;

    /// Return the newest published snapshot without consuming it.
    async fn latest(&self) -> Result<Snapshot, ChannelError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Encode `snapshot` as one newline-terminated JSON record.
pub fn encode_record(snapshot: &Snapshot) -> Result<String, ChannelError> {
    let mut record = serde_json::to_string(snapshot).map_err(ChannelError::Encode)?;
    record.push('\n');
    Ok(record)
}

/// Decode the last non-blank record in `text`.
///
/// Earlier records are superseded and never parsed.
pub fn decode_latest(text: &str) -> Result<Snapshot, ChannelError> {
    let line = text
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .ok_or(ChannelError::NoData)?;

    serde_json::from_str(line).map_err(ChannelError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(cpu_percent: f64) -> Snapshot {
        Snapshot {
            timestamp: 1_700_000_000.0 + cpu_percent,
            cpu_percent,
            memory_percent: 30.0,
            disk_io_bytes: 10,
            net_io_bytes: 20,
            load_avg: 0.1,
        }
    }

    #[test]
    fn test_record_is_single_line() {
        let record = encode_record(&snapshot(1.0)).unwrap();
        assert!(record.ends_with('\n'));
        assert_eq!(record.matches('\n').count(), 1);
    }

    #[test]
    fn test_decode_latest_picks_last_record() {
        let text = [1.0, 2.0, 3.0]
            .iter()
            .map(|cpu| encode_record(&snapshot(*cpu)).unwrap())
            .collect::<String>();

        assert_eq!(decode_latest(&text).unwrap(), snapshot(3.0));
    }

    #[test]
    fn test_decode_latest_ignores_blank_lines() {
        let text = format!("{}\n\n  \n", encode_record(&snapshot(7.0)).unwrap());
        assert_eq!(decode_latest(&text).unwrap(), snapshot(7.0));
    }

    #[test]
    fn test_decode_latest_empty_is_no_data() {
        assert!(matches!(decode_latest(""), Err(ChannelError::NoData)));
        assert!(matches!(decode_latest("\n\n"), Err(ChannelError::NoData)));
    }

    #[test]
    fn test_decode_latest_truncated_is_malformed() {
        let err = decode_latest("{\"timestamp\": 1.0, \"cpu_perc").unwrap_err();
        assert!(matches!(err, ChannelError::Malformed(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_epoch_timestamps_decode_exactly() {
        for i in 0..200_000u32 {
            let mut original = snapshot(1.0);
            original.timestamp = 1_760_000_000.0 + f64::from(i) * 0.000_123_7;

            let decoded = decode_latest(&encode_record(&original).unwrap()).unwrap();
            assert_eq!(
                decoded.timestamp.to_bits(),
                original.timestamp.to_bits(),
                "timestamp {} changed on the wire",
                original.timestamp
            );
        }
    }

    #[test]
    fn test_absent_message_names_path() {
        let err = ChannelError::Absent {
            path: PathBuf::from("/tmp/metrics_pipe"),
        };
        assert_eq!(err.to_string(), "Metrics channel not found at /tmp/metrics_pipe");
    }
}
