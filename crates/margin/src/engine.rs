//! The engine: one catalog source shared by search, graph and ranking.

use crate::config::EngineConfig;
use crate::Result;
use margin_core::{CatalogSource, EntityKind, JsonCatalog};
use margin_embeddings::{Embedder, EmbeddingService};
use margin_graph::{GraphNode, GraphQueryEngine, GraphStats, KnowledgeGraph, NodeSubgraph, NodeType};
use margin_rank::{ReasonWriter, RecommendOptions, RecommendedItem, Recommender, UserProfile};
use margin_vectors::{IndexItem, RankedResult, SearchOptions, SimilarityIndex};
use std::path::Path;
use std::sync::Arc;

/// Knowledge retrieval over a catalog of episodes, books, speakers and quotes.
///
/// ```rust,ignore
/// use margin::prelude::*;
///
/// let engine = KnowledgeEngine::new(EngineConfig::default(), Arc::new(JsonCatalog::new("catalog.json")))?;
/// engine.index_catalog().await?;
///
/// let hits = engine.search("habit formation", &engine.search_options()).await?;
/// let top = engine.most_connected(5, Some(NodeType::Book)).await?;
/// let picks = engine
///     .recommend(&UserProfile::new().with_topic("habits", 1.0), EntityKind::Book, &RecommendOptions::default())
///     .await?;
/// ```
pub struct KnowledgeEngine {
    config: EngineConfig,
    source: Arc<dyn CatalogSource>,
    index: Arc<SimilarityIndex>,
    graph: GraphQueryEngine,
    recommender: Recommender,
}

impl KnowledgeEngine {
    /// Build an engine with the embedder named in `config`.
    pub fn new(config: EngineConfig, source: Arc<dyn CatalogSource>) -> Result<Self> {
        let embeddings = config.embedding.build_service()?;
        Self::assemble(config, source, embeddings)
    }

    /// Build an engine around a caller-supplied embedder. Retry and batch
    /// settings still come from `config`.
    pub fn with_embedder(
        config: EngineConfig,
        source: Arc<dyn CatalogSource>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let embeddings = EmbeddingService::new(embedder)
            .with_retry(config.embedding.retry_policy())
            .with_batch_size(config.embedding.batch_size.max(1));
        Self::assemble(config, source, embeddings)
    }

    /// Engine over the JSON catalog named in `config`, resolved against `base_dir`.
    pub fn from_json_catalog(config: EngineConfig, base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(&config.catalog.path);
        Self::new(config, Arc::new(JsonCatalog::new(path)))
    }

    fn assemble(
        config: EngineConfig,
        source: Arc<dyn CatalogSource>,
        embeddings: EmbeddingService,
    ) -> Result<Self> {
        config.validate()?;
        let index = Arc::new(SimilarityIndex::new(embeddings.clone()));
        let graph = GraphQueryEngine::new(source.clone(), &config.graph);
        let recommender = Recommender::new(embeddings, source.clone())
            .with_index(index.clone())
            .with_config(config.ranking.clone())?;
        Ok(Self {
            config,
            source,
            index,
            graph,
            recommender,
        })
    }

    /// Replace the template reason writer.
    pub fn with_reasons(mut self, reasons: Arc<dyn ReasonWriter>) -> Self {
        self.recommender = self.recommender.with_reasons(reasons);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.source
    }

    pub fn index(&self) -> &Arc<SimilarityIndex> {
        &self.index
    }

    pub fn graph(&self) -> &GraphQueryEngine {
        &self.graph
    }

    /// Default search options from the `[search]` section. An unset threshold
    /// follows the embedding provider.
    pub fn search_options(&self) -> SearchOptions {
        self.config.search.options(self.config.embedding.provider)
    }

    // -- similarity --------------------------------------------------------

    /// Embed every catalog entity into the similarity index.
    ///
    /// Re-indexing replaces entries with the same kind and id; it does not
    /// remove entries for entities that have left the catalog.
    pub async fn index_catalog(&self) -> Result<usize> {
        let catalog = self.source.load_catalog().await?;
        let items = IndexItem::from_catalog(&catalog);
        let indexed = self.index.index_batch(items).await?;
        tracing::info!(source = self.source.name(), indexed, "indexed catalog");
        Ok(indexed)
    }

    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<RankedResult>> {
        Ok(self.index.search(query, options).await?)
    }

    /// Items most similar to an indexed item, excluding the item itself.
    pub async fn find_similar(
        &self,
        kind: EntityKind,
        id: &str,
        limit: usize,
    ) -> Result<Vec<RankedResult>> {
        Ok(self.index.find_similar_to(kind, id, limit).await?)
    }

    // -- graph -------------------------------------------------------------

    pub async fn full_graph(&self, force_refresh: bool) -> Result<Arc<KnowledgeGraph>> {
        Ok(self.graph.get_full_graph(force_refresh).await?)
    }

    pub async fn graph_by_type(&self, types: &[NodeType]) -> Result<KnowledgeGraph> {
        Ok(self.graph.get_by_type(types).await?)
    }

    pub async fn node_subgraph(&self, node_id: &str, depth: usize) -> Result<NodeSubgraph> {
        Ok(self.graph.get_node_subgraph(node_id, depth).await?)
    }

    pub async fn search_nodes(&self, query: &str, types: Option<&[NodeType]>) -> Result<Vec<GraphNode>> {
        Ok(self.graph.search_nodes(query, types).await?)
    }

    /// Highest-degree nodes with their degree.
    pub async fn most_connected(
        &self,
        limit: usize,
        node_type: Option<NodeType>,
    ) -> Result<Vec<(GraphNode, usize)>> {
        Ok(self.graph.get_most_connected_nodes(limit, node_type).await?)
    }

    pub async fn find_path(
        &self,
        source_id: &str,
        target_id: &str,
        max_depth: Option<usize>,
    ) -> Result<Option<Vec<GraphNode>>> {
        Ok(self.graph.find_path(source_id, target_id, max_depth).await?)
    }

    pub async fn graph_stats(&self) -> Result<GraphStats> {
        Ok(self.graph.get_graph_stats().await?)
    }

    /// Drop the cached graph; the next graph call rebuilds it.
    pub async fn invalidate_graph(&self) {
        self.graph.invalidate().await;
    }

    // -- ranking -----------------------------------------------------------

    pub async fn recommend(
        &self,
        profile: &UserProfile,
        kind: EntityKind,
        options: &RecommendOptions,
    ) -> Result<Vec<RecommendedItem>> {
        Ok(self.recommender.recommend(profile, kind, options).await?)
    }
}

impl std::fmt::Debug for KnowledgeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeEngine")
            .field("source", &self.source.name())
            .field("graph", &self.graph)
            .field("recommender", &self.recommender)
            .finish()
    }
}
