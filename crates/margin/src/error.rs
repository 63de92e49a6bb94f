//! Unified error type for the engine facade.

use margin_core::CatalogError;
use margin_embeddings::EmbeddingError;
use margin_graph::GraphError;
use margin_rank::RankError;
use margin_vectors::VectorError;
use thiserror::Error;

/// Any error raised through [`crate::KnowledgeEngine`].
///
/// Each crate's error keeps its variant, so callers can still match on
/// e.g. `Error::Embedding(EmbeddingError::RateLimited { .. })`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Rank(#[from] RankError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
