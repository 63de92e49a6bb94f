//! Single-slot cache for built graph snapshots.

use crate::snapshot::GraphSnapshot;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A snapshot and the moment it was built.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: GraphSnapshot,
    pub built_at: Instant,
}

impl CacheEntry {
    pub fn new(snapshot: GraphSnapshot) -> Self {
        Self {
            snapshot,
            built_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.built_at.elapsed() < ttl
    }
}

/// Storage for the current graph snapshot.
#[async_trait]
pub trait GraphCache: Send + Sync {
    async fn get(&self) -> Option<CacheEntry>;

    /// Replace the slot.
    async fn put(&self, entry: CacheEntry);

    async fn clear(&self);
}

#[derive(Debug, Default)]
pub struct InMemoryGraphCache {
    slot: RwLock<Option<CacheEntry>>,
}

impl InMemoryGraphCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphCache for InMemoryGraphCache {
    async fn get(&self) -> Option<CacheEntry> {
        self.slot.read().await.clone()
    }

    async fn put(&self, entry: CacheEntry) {
        *self.slot.write().await = Some(entry);
    }

    async fn clear(&self) {
        self.slot.write().await.take();
    }
}
