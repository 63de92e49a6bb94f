//! # Margin Embeddings
//!
//! Embedding service adapter for the Margin knowledge retrieval engine.
//!
//! This crate turns text into comparable vectors:
//! - Provider seam ([`Embedder`]) with an offline hashing backend and hosted APIs
//! - [`EmbeddingService`] with retry, concurrent batching and validation
//! - Long-text chunking and vector math
//!
//! ## Features
//!
//! - `api`: hosted embeddings (OpenAI, Voyage, Cohere, OpenAI-compatible)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use margin_embeddings::prelude::*;
//! use std::sync::Arc;
//!
//! let service = EmbeddingService::new(Arc::new(SimpleEmbedder::new(256)));
//! let a = service.embed("building better habits").await?;
//! let b = service.embed("habit formation and identity").await?;
//! let similarity = cosine_similarity(&a, &b)?;
//! ```

mod chunker;
mod embedder;
mod retry;
mod service;
mod simple;
pub mod vector;

pub use chunker::{Chunk, ChunkConfig, Chunker};
pub use embedder::{Embedder, EmbeddingError, EmbeddingResult};
pub use retry::RetryPolicy;
pub use service::{EmbeddingService, DEFAULT_BATCH_SIZE};
pub use simple::SimpleEmbedder;
pub use vector::{cosine_similarity, normalize};

#[cfg(feature = "api")]
mod api;
#[cfg(feature = "api")]
pub use api::{ApiConfig, ApiEmbedder, ApiProvider};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{cosine_similarity, normalize};
    pub use crate::{ChunkConfig, Chunker, RetryPolicy, SimpleEmbedder};
    pub use crate::{Embedder, EmbeddingError, EmbeddingResult, EmbeddingService};

    #[cfg(feature = "api")]
    pub use crate::{ApiConfig, ApiEmbedder};
}
