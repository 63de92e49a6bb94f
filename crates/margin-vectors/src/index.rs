//! Semantic search over embedded catalog items.

use crate::memory::InMemoryStore;
use crate::{ItemKey, SearchFilter, VectorError, VectorRecord, VectorResult, VectorStore};
use margin_core::{Catalog, EntityKind, ItemMetadata};
use margin_embeddings::EmbeddingService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of results returned by a search.
pub const DEFAULT_LIMIT: usize = 10;

/// Default minimum similarity for a search hit.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub limit: usize,
    pub threshold: f32,
    /// Restrict results to these kinds. `None` searches all kinds.
    #[serde(default)]
    pub kinds: Option<Vec<EntityKind>>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            threshold: DEFAULT_THRESHOLD,
            kinds: None,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_kinds(mut self, kinds: Vec<EntityKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    fn validate(&self) -> VectorResult<()> {
        if self.limit == 0 {
            return Err(VectorError::InvalidInput(
                "limit must be at least 1".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.threshold) {
            return Err(VectorError::InvalidInput(format!(
                "threshold must be within [-1, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    fn filter(&self) -> SearchFilter {
        SearchFilter {
            limit: self.limit,
            threshold: self.threshold,
            kinds: self.kinds.clone(),
            exclude: None,
        }
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: String,
    pub kind: EntityKind,
    /// Cosine similarity to the query.
    pub score: f32,
    pub content: String,
    pub metadata: ItemMetadata,
}

/// An item to be embedded and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexItem {
    pub id: String,
    pub kind: EntityKind,
    pub content: String,
    pub metadata: ItemMetadata,
}

impl IndexItem {
    pub fn new(
        id: impl Into<String>,
        kind: EntityKind,
        content: impl Into<String>,
        metadata: ItemMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
            metadata,
        }
    }

    /// One item per episode, book, speaker and quote, in catalog order.
    ///
    /// Entities whose text is entirely blank are skipped.
    pub fn from_catalog(catalog: &Catalog) -> Vec<IndexItem> {
        let mut items = Vec::with_capacity(catalog.entity_count());

        for e in &catalog.episodes {
            items.push(IndexItem::new(&e.id, EntityKind::Episode, e.content_text(), e.into()));
        }
        for b in &catalog.books {
            items.push(IndexItem::new(&b.id, EntityKind::Book, b.content_text(), b.into()));
        }
        for s in &catalog.speakers {
            items.push(IndexItem::new(&s.id, EntityKind::Speaker, s.content_text(), s.into()));
        }
        for q in &catalog.quotes {
            items.push(IndexItem::new(&q.id, EntityKind::Quote, q.content_text(), q.into()));
        }

        items.retain(|item| !item.content.is_empty());
        items
    }
}

/// Embeds items into a [`VectorStore`] and answers similarity queries.
///
/// Embedding always happens before the store is touched, so a provider
/// failure never leaves a partial write behind.
pub struct SimilarityIndex {
    embeddings: EmbeddingService,
    store: Arc<dyn VectorStore>,
}

impl SimilarityIndex {
    /// Create an index over a fresh [`InMemoryStore`].
    pub fn new(embeddings: EmbeddingService) -> Self {
        Self::with_store(embeddings, Arc::new(InMemoryStore::new()))
    }

    pub fn with_store(embeddings: EmbeddingService, store: Arc<dyn VectorStore>) -> Self {
        Self { embeddings, store }
    }

    pub fn embeddings(&self) -> &EmbeddingService {
        &self.embeddings
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Embed `content` and store it under `(kind, id)`, replacing any previous entry.
    pub async fn index(
        &self,
        id: &str,
        kind: EntityKind,
        content: &str,
        metadata: ItemMetadata,
    ) -> VectorResult<()> {
        let vector = self.embeddings.embed(content).await?;
        let record = VectorRecord::new(ItemKey::new(kind, id), content, vector).with_metadata(metadata);
        self.store.upsert(vec![record]).await?;
        tracing::debug!(kind = %kind, id, "indexed item");
        Ok(())
    }

    /// Embed all items in one batched call, then store them.
    ///
    /// Returns the number of items stored. Nothing is stored if any
    /// embedding fails.
    pub async fn index_batch(&self, items: Vec<IndexItem>) -> VectorResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = items.iter().map(|item| item.content.as_str()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;

        let records: Vec<VectorRecord> = items
            .into_iter()
            .zip(vectors)
            .map(|(item, vector)| {
                VectorRecord::new(ItemKey::new(item.kind, item.id), item.content, vector)
                    .with_metadata(item.metadata)
            })
            .collect();
        let count = records.len();
        self.store.upsert(records).await?;

        tracing::info!(count, model = self.embeddings.model_name(), "indexed items");
        Ok(count)
    }

    /// Remove an item. Removing an absent item is not an error.
    pub async fn remove(&self, id: &str, kind: EntityKind) -> VectorResult<()> {
        self.store.delete(&ItemKey::new(kind, id)).await?;
        Ok(())
    }

    pub async fn clear(&self) -> VectorResult<()> {
        self.store.clear().await
    }

    pub async fn len(&self) -> VectorResult<usize> {
        self.store.count().await
    }

    pub async fn is_empty(&self) -> VectorResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Stored embedding of an item, if indexed.
    pub async fn embedding_of(&self, kind: EntityKind, id: &str) -> VectorResult<Option<Vec<f32>>> {
        Ok(self
            .store
            .get(&ItemKey::new(kind, id))
            .await?
            .map(|record| record.vector))
    }

    /// Items most similar to `query`, best first.
    ///
    /// An empty index returns no results without calling the provider.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> VectorResult<Vec<RankedResult>> {
        options.validate()?;
        if self.is_empty().await? {
            return Ok(Vec::new());
        }

        let vector = self.embeddings.embed(query).await?;
        let hits = self.store.search(&vector, &options.filter()).await?;

        tracing::debug!(query, hits = hits.len(), "similarity search");
        Ok(hits.into_iter().map(ranked).collect())
    }

    /// Items most similar to an already indexed item, excluding the item itself.
    pub async fn find_similar_to(
        &self,
        kind: EntityKind,
        id: &str,
        limit: usize,
    ) -> VectorResult<Vec<RankedResult>> {
        let options = SearchOptions::default().with_limit(limit);
        options.validate()?;

        let key = ItemKey::new(kind, id);
        let source = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| VectorError::NotFound(key.to_string()))?;

        let filter = options.filter().excluding(key);
        let hits = self.store.search(&source.vector, &filter).await?;
        Ok(hits.into_iter().map(ranked).collect())
    }
}

fn ranked(hit: crate::ScoredRecord) -> RankedResult {
    let record = hit.record;
    RankedResult {
        id: record.key.id,
        kind: record.key.kind,
        score: hit.score,
        content: record.content,
        metadata: record.metadata,
    }
}
