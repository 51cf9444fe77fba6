//! The collector loop: sample, build, publish, forever.

use crate::channel::SnapshotChannel;
use crate::error::Result;
use crate::metrics::{
    backoff::Backoff,
    builder::SnapshotBuilder,
    data::Snapshot,
    traits::CounterSource,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info, warn};

/// Tuning for the collector loop.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// CPU observation window, which also paces the loop
    pub cpu_window: Duration,
    /// Delay after the first failure
    pub backoff: Duration,
    /// Upper bound for the retry delay
    pub max_backoff: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            cpu_window: Duration::from_millis(crate::DEFAULT_CPU_WINDOW_MS),
            backoff: Duration::from_millis(crate::DEFAULT_BACKOFF_MS),
            max_backoff: Duration::from_millis(crate::DEFAULT_MAX_BACKOFF_MS),
        }
    }
}

impl CollectorConfig {
    pub fn with_cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn build_backoff(&self) -> Backoff {
        Backoff::new(self.backoff, self.max_backoff)
    }
}

/// Drives a [`CounterSource`] and publishes every snapshot to a channel.
pub struct Collector<S> {
    source: S,
    channel: Arc<dyn SnapshotChannel>,
    backoff: Backoff,
    builder: Option<SnapshotBuilder>,
}

impl<S: CounterSource + Send> Collector<S> {
    pub fn new(source: S, channel: Arc<dyn SnapshotChannel>, backoff: Backoff) -> Self {
        Self {
            source,
            channel,
            backoff,
            builder: None,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.backoff.consecutive_failures()
    }

    /// Run one sampling pass and publish the result.
    ///
    /// The first call only records the baseline counters and then takes a
    /// second reading, so every published snapshot carries a real delta.
    pub async fn tick(&mut self) -> Result<Snapshot> {
        let builder = match self.builder.take() {
            Some(builder) => builder,
            None => SnapshotBuilder::new(&self.source.read().await?),
        };
        let builder = self.builder.insert(builder);

        let reading = self.source.read().await?;
        let snapshot = builder.build(&reading);

        self.channel.publish(&snapshot).await?;
        Ok(snapshot)
    }

    /// Run one pass and update the failure streak.
    ///
    /// Returns the delay to wait before the next pass when this one failed.
    pub async fn pass(&mut self) -> Option<Duration> {
        match self.tick().await {
            Ok(snapshot) => {
                if self.backoff.consecutive_failures() > 0 {
                    info!(
                        "Collector recovered after {} failed passes",
                        self.backoff.consecutive_failures()
                    );
                }
                self.backoff.mark_success();
                debug!(
                    "Published snapshot: cpu={:.1}% mem={:.1}% disk={}B net={}B load={:.2}",
                    snapshot.cpu_percent,
                    snapshot.memory_percent,
                    snapshot.disk_io_bytes,
                    snapshot.net_io_bytes,
                    snapshot.load_avg
                );
                None
            }
            Err(e) => {
                let delay = self.backoff.mark_failure();
                if self.backoff.is_escalated() {
                    error!(
                        "Collector pass failed ({} consecutive failures), retrying in {:?}: {}",
                        self.backoff.consecutive_failures(),
                        delay,
                        e
                    );
                } else {
                    warn!("Collector pass failed, retrying in {:?}: {}", delay, e);
                }
                Some(delay)
            }
        }
    }

    /// Loop forever. Failures are logged and retried after a backoff delay.
    pub async fn run(mut self) {
        info!("Collector started, publishing to {}", self.channel.describe());

        loop {
            if let Some(delay) = self.pass().await {
                time::sleep(delay).await;
            }
        }
    }
}
