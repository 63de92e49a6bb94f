//! # Margin Vectors
//!
//! Similarity index for the Margin knowledge retrieval engine.
//!
//! Items (episodes, books, speakers, quotes) are embedded once and kept in a
//! [`VectorStore`]; queries are embedded and scored against every stored
//! item by cosine similarity.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use margin_vectors::prelude::*;
//! use std::sync::Arc;
//!
//! let index = SimilarityIndex::new(EmbeddingService::new(Arc::new(SimpleEmbedder::new(256))));
//! index
//!     .index("e1", EntityKind::Episode, "Atomic habits and identity", ItemMetadata::None)
//!     .await?;
//!
//! for hit in index.search("building better habits", &SearchOptions::default()).await? {
//!     println!("{} {}: {:.3}", hit.kind, hit.id, hit.score);
//! }
//! ```
//!
//! The default store is [`InMemoryStore`]. Persistent backends plug in by
//! implementing [`VectorStore`] and passing it to [`SimilarityIndex::with_store`].

pub mod index;
pub mod memory;

use async_trait::async_trait;
use margin_core::{EntityKind, ItemMetadata};
use margin_embeddings::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with the similarity index.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store lock poisoned: {0}")]
    Lock(String),
}

/// Result type for vector operations.
pub type VectorResult<T> = Result<T, VectorError>;

/// Identity of an indexed item: ids are only unique within a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub kind: EntityKind,
    pub id: String,
}

impl ItemKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A stored item: its content, embedding and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub key: ItemKey,
    /// The text that was embedded.
    pub content: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: ItemMetadata,
}

impl VectorRecord {
    pub fn new(key: ItemKey, content: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            key,
            content: content.into(),
            vector,
            metadata: ItemMetadata::None,
        }
    }

    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Get the vector dimension.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Constraints applied by a store while scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    /// Maximum number of results.
    pub limit: usize,
    /// Minimum cosine similarity; lower scores are dropped.
    pub threshold: f32,
    /// Restrict to these kinds. `None` means all kinds.
    pub kinds: Option<Vec<EntityKind>>,
    /// Never return this item.
    pub exclude: Option<ItemKey>,
}

impl SearchFilter {
    pub fn new(limit: usize, threshold: f32) -> Self {
        Self {
            limit,
            threshold,
            kinds: None,
            exclude: None,
        }
    }

    pub fn with_kinds(mut self, kinds: Vec<EntityKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    pub fn excluding(mut self, key: ItemKey) -> Self {
        self.exclude = Some(key);
        self
    }

    /// Whether a record passes the kind and exclusion constraints.
    pub fn admits(&self, key: &ItemKey) -> bool {
        if self.exclude.as_ref() == Some(key) {
            return false;
        }
        match &self.kinds {
            Some(kinds) => kinds.contains(&key.kind),
            None => true,
        }
    }
}

/// A record with its similarity to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: VectorRecord,
    pub score: f32,
}

/// Storage seam for indexed items.
///
/// Implementations keep records in insertion order: re-upserting an existing
/// key replaces its content in place, and equal scores are returned in that
/// order.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Vector dimension, once known.
    fn dimension(&self) -> Option<usize>;

    /// Insert or replace records. Either every record is stored or none is.
    async fn upsert(&self, records: Vec<VectorRecord>) -> VectorResult<()>;

    /// Get a record by key.
    async fn get(&self, key: &ItemKey) -> VectorResult<Option<VectorRecord>>;

    /// Delete a record. Returns whether it existed.
    async fn delete(&self, key: &ItemKey) -> VectorResult<bool>;

    /// Clear all records from the store.
    async fn clear(&self) -> VectorResult<()>;

    /// Get the total number of records in the store.
    async fn count(&self) -> VectorResult<usize>;

    /// Score every admitted record against `vector`, best first.
    async fn search(&self, vector: &[f32], filter: &SearchFilter)
        -> VectorResult<Vec<ScoredRecord>>;
}

pub use index::{IndexItem, RankedResult, SearchOptions, SimilarityIndex};
pub use memory::InMemoryStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        IndexItem, InMemoryStore, ItemKey, RankedResult, SearchOptions, SimilarityIndex,
        VectorError, VectorRecord, VectorResult, VectorStore,
    };
    pub use margin_core::{EntityKind, ItemMetadata};
    pub use margin_embeddings::{EmbeddingService, SimpleEmbedder};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_record() {
        let record = VectorRecord::new(ItemKey::new(EntityKind::Book, "b1"), "Deep Work", vec![0.1, 0.2, 0.3])
            .with_metadata(ItemMetadata::Book {
                title: "Deep Work".into(),
                author: None,
                category: None,
            });

        assert_eq!(record.key.id, "b1");
        assert_eq!(record.dimension(), 3);
        assert_eq!(record.metadata.title(), Some("Deep Work"));
    }

    #[test]
    fn keys_are_scoped_by_kind() {
        let episode = ItemKey::new(EntityKind::Episode, "1");
        let book = ItemKey::new(EntityKind::Book, "1");
        assert_ne!(episode, book);
        assert_eq!(episode.to_string(), "episode:1");
    }

    #[test]
    fn filter_admits_by_kind_and_exclusion() {
        let e1 = ItemKey::new(EntityKind::Episode, "e1");
        let b1 = ItemKey::new(EntityKind::Book, "b1");

        let filter = SearchFilter::new(10, 0.0).with_kinds(vec![EntityKind::Episode]);
        assert!(filter.admits(&e1));
        assert!(!filter.admits(&b1));

        let filter = SearchFilter::new(10, 0.0).excluding(e1.clone());
        assert!(!filter.admits(&e1));
        assert!(filter.admits(&b1));
    }
}
