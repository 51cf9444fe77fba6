//! In-process channel used when the collector and server share a process.

use super::{ChannelError, SnapshotChannel};
use crate::metrics::Snapshot;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lock-protected single slot holding the latest snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    slot: Arc<RwLock<Option<Snapshot>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotChannel for MemoryChannel {
    async fn publish(&self, snapshot: &Snapshot) -> Result<(), ChannelError> {
        *self.slot.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn latest(&self) -> Result<Snapshot, ChannelError> {
        self.slot.read().await.clone().ok_or(ChannelError::NoData)
    }

    fn describe(&self) -> String {
        "in-process slot".to_string()
    }
}
