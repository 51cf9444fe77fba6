//! Traits for host counter sampling.

use crate::error::Result;
use crate::metrics::data::RawReading;

/// Source of raw OS counters and gauges.
///
/// One call to [`CounterSource::read`] is one sampling pass. Implementations
/// may block for their CPU observation window; cumulative counters must be
/// returned as-is, deltas are computed by the
/// [`SnapshotBuilder`](crate::metrics::builder::SnapshotBuilder).
pub trait CounterSource {
    /// Take one reading of every counter and gauge.
    fn read(&mut self) -> impl std::future::Future<Output = Result<RawReading>> + Send;
}
