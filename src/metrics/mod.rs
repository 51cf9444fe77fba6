//! Host metrics sampling and snapshot construction.
//!
//! This module reads CPU, memory, disk I/O, network I/O and load average from
//! the host, turns consecutive readings into [`Snapshot`]s, and runs the
//! collector loop that publishes them.

pub mod backoff;
pub mod builder;
pub mod collector;
pub mod data;
pub mod sampler;
pub mod traits;

// Re-export commonly used items
pub use backoff::Backoff;
pub use builder::SnapshotBuilder;
pub use collector::{Collector, CollectorConfig};
pub use data::{IoCounters, RawReading, Snapshot};
pub use sampler::HostSampler;
pub use traits::CounterSource;
