//! # hostpulse - Host Metrics Pipeline
//!
//! A collector samples host performance counters once per tick and publishes
//! the newest [`Snapshot`] to a channel; an HTTP server answers
//! `GET /metrics` with whatever the channel currently holds.
//!
//! ## Features
//!
//! - **Snapshots**: CPU %, memory %, disk and network I/O deltas, 1-minute load average
//! - **Two transports**: a world-readable file slot shared between processes,
//!   or an in-process slot when collector and server run together
//! - **Never-fatal collector**: failed passes are logged and retried with bounded backoff
//! - **Clear status codes**: 200 with the snapshot, 503 before the first
//!   publish, 500 for anything broken
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hostpulse::{
//!     shutdown_signal, start_web_server, Backoff, Collector, HostSampler, MemoryChannel,
//!     WebConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let channel = Arc::new(MemoryChannel::new());
//!     let collector = Collector::new(HostSampler::default(), channel.clone(), Backoff::default());
//!     tokio::spawn(collector.run());
//!
//!     start_web_server(WebConfig::default(), channel, shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod metrics;
pub mod shutdown;
pub mod web;

// Re-export public API
pub use channel::{ChannelError, ChannelGuard, FileChannel, MemoryChannel, SnapshotChannel};
pub use error::{PulseError, Result};
pub use metrics::{
    backoff::Backoff,
    collector::{Collector, CollectorConfig},
    data::{IoCounters, RawReading, Snapshot},
    sampler::HostSampler,
    traits::CounterSource,
};
pub use shutdown::shutdown_signal;
pub use web::{start_web_server, WebConfig};

/// Default location of the channel file
pub const DEFAULT_CHANNEL_PATH: &str = "/tmp/metrics_pipe";

/// Default CPU observation window in milliseconds; also the collector's tick period
pub const DEFAULT_CPU_WINDOW_MS: u64 = 1000;

/// Default delay after the first failed collector pass
pub const DEFAULT_BACKOFF_MS: u64 = 5000;

/// Default upper bound for the collector retry delay
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;

/// The default web server bind host
pub const DEFAULT_WEB_HOST: &str = "0.0.0.0";

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 5050;
