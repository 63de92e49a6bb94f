//! Cached graph queries.
//!
//! The engine serves every query from a snapshot built from the catalog and
//! kept for a configurable TTL. Rebuilds are serialized by a mutex; readers
//! keep using whatever `Arc` they already hold, so a swap never tears.

use crate::builder::GraphBuilder;
use crate::cache::{CacheEntry, GraphCache, InMemoryGraphCache};
use crate::config::GraphConfig;
use crate::error::GraphResult;
use crate::model::{GraphNode, KnowledgeGraph, NodeType};
use crate::snapshot::{GraphSnapshot, GraphStats, NodeSubgraph};
use margin_core::CatalogSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct GraphQueryEngine {
    source: Arc<dyn CatalogSource>,
    builder: GraphBuilder,
    cache: Arc<dyn GraphCache>,
    ttl: Duration,
    max_path_depth: usize,
    rebuild: Mutex<()>,
    version: AtomicU64,
}

impl GraphQueryEngine {
    pub fn new(source: Arc<dyn CatalogSource>, config: &GraphConfig) -> Self {
        Self {
            source,
            builder: GraphBuilder::from_config(config),
            cache: Arc::new(InMemoryGraphCache::new()),
            ttl: config.ttl(),
            max_path_depth: config.max_path_depth,
            rebuild: Mutex::new(()),
            version: AtomicU64::new(0),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn GraphCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn snapshot(&self, force_refresh: bool) -> GraphResult<GraphSnapshot> {
        let seen = self.cache.get().await;
        if let Some(entry) = &seen {
            if !force_refresh && entry.is_fresh(self.ttl) {
                tracing::debug!(version = entry.snapshot.version(), "graph cache hit");
                return Ok(entry.snapshot.clone());
            }
        }
        let seen_version = seen.map(|e| e.snapshot.version());

        let _guard = self.rebuild.lock().await;

        // Another caller may have rebuilt while we waited for the lock.
        if let Some(entry) = self.cache.get().await {
            let rebuilt_meanwhile = Some(entry.snapshot.version()) != seen_version;
            if entry.is_fresh(self.ttl) && (!force_refresh || rebuilt_meanwhile) {
                return Ok(entry.snapshot);
            }
        }

        let catalog = match self.source.load_catalog().await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(source = self.source.name(), error = %e, "graph rebuild failed, keeping previous snapshot");
                return Err(e.into());
            }
        };

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = GraphSnapshot::new(self.builder.build(&catalog, version));
        self.cache.put(CacheEntry::new(snapshot.clone())).await;
        tracing::debug!(version, "graph cache rebuilt");
        Ok(snapshot)
    }

    /// The full graph; rebuilt when the cache is stale or `force_refresh` is set.
    pub async fn get_full_graph(&self, force_refresh: bool) -> GraphResult<Arc<KnowledgeGraph>> {
        Ok(self.snapshot(force_refresh).await?.graph().clone())
    }

    /// Nodes of the given types and the edges between them.
    pub async fn get_by_type(&self, types: &[NodeType]) -> GraphResult<KnowledgeGraph> {
        Ok(self.snapshot(false).await?.by_type(types))
    }

    pub async fn get_node_subgraph(&self, node_id: &str, depth: usize) -> GraphResult<NodeSubgraph> {
        self.snapshot(false).await?.subgraph(node_id, depth)
    }

    pub async fn search_nodes(&self, query: &str, types: Option<&[NodeType]>) -> GraphResult<Vec<GraphNode>> {
        Ok(self.snapshot(false).await?.search_nodes(query, types))
    }

    pub async fn get_most_connected_nodes(
        &self,
        limit: usize,
        node_type: Option<NodeType>,
    ) -> GraphResult<Vec<(GraphNode, usize)>> {
        Ok(self.snapshot(false).await?.most_connected(limit, node_type))
    }

    /// Shortest path between two nodes; `max_depth` defaults to the configured hop limit.
    pub async fn find_path(
        &self,
        source: &str,
        target: &str,
        max_depth: Option<usize>,
    ) -> GraphResult<Option<Vec<GraphNode>>> {
        let max_depth = max_depth.unwrap_or(self.max_path_depth);
        self.snapshot(false).await?.find_path(source, target, max_depth)
    }

    pub async fn get_graph_stats(&self) -> GraphResult<GraphStats> {
        Ok(self.snapshot(false).await?.stats())
    }

    /// Drop the cached snapshot; the next query rebuilds.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
        tracing::debug!("graph cache invalidated");
    }

    /// Whatever snapshot is cached, fresh or not.
    pub async fn cached_graph(&self) -> Option<Arc<KnowledgeGraph>> {
        self.cache
            .get()
            .await
            .map(|entry| entry.snapshot.graph().clone())
    }
}

impl std::fmt::Debug for GraphQueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQueryEngine")
            .field("source", &self.source.name())
            .field("ttl", &self.ttl)
            .field("max_path_depth", &self.max_path_depth)
            .field("version", &self.version.load(Ordering::SeqCst))
            .finish()
    }
}
