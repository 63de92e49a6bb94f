//! # Margin
//!
//! Knowledge retrieval for long-form audio catalogs.
//!
//! Margin turns a catalog of podcast episodes, the books they mention, the
//! speakers who appear on them and the quotes they produce into three
//! read-only services:
//!
//! - **Similarity search** over embedded catalog text
//! - **Knowledge graph** queries (neighborhoods, paths, hubs) over a cached
//!   graph derived from the catalog
//! - **Recommendations** ranked by similarity, recency, popularity and topic
//!   match against a listener profile
//!
//! ## Quick Start
//!
//! ```rust
//! use margin::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let catalog = Catalog {
//!     episodes: vec![Episode {
//!         id: "e1".into(),
//!         title: "Building better habits".into(),
//!         topics: vec!["habits".into()],
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let engine = KnowledgeEngine::new(
//!     EngineConfig::default(),
//!     Arc::new(InMemoryCatalog::new(catalog)),
//! ).unwrap();
//! engine.index_catalog().await.unwrap();
//!
//! let stats = engine.graph_stats().await.unwrap();
//! assert_eq!(stats.nodes_by_type[&NodeType::Episode], 1);
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`margin_core`] - catalog entities and the `CatalogSource` trait
//! - [`margin_embeddings`] - embedders, retry, batching
//! - [`margin_vectors`] - vector store and similarity index
//! - [`margin_graph`] - graph builder, cache and query engine
//! - [`margin_rank`] - profile-driven recommendation ranking
//!
//! ## Features
//!
//! | Feature  | Enables |
//! |----------|---------|
//! | `api`    | Hosted embedding providers over HTTP |
//! | `llm`    | Chat-completion recommendation reasons |
//! | `sqlite` | `SqliteCatalog` |

pub mod config;
pub mod engine;
pub mod error;

pub use config::{
    CatalogConfig, EmbeddingConfig, EngineConfig, ProviderKind, SearchConfig, SIMPLE_THRESHOLD,
};
pub use engine::KnowledgeEngine;
pub use error::{Error, Result};

// Re-export all subcrates
pub use margin_core as core;
pub use margin_embeddings as embeddings;
pub use margin_graph as graph;
pub use margin_rank as rank;
pub use margin_vectors as vectors;

/// Prelude module for convenient imports.
///
/// ```rust
/// use margin::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{EngineConfig, Error, KnowledgeEngine, Result};

    // Catalog
    pub use margin_core::{
        Book, Catalog, CatalogSource, EntityKind, Episode, InMemoryCatalog, ItemMetadata,
        JsonCatalog, Quote, Speaker,
    };

    #[cfg(feature = "sqlite")]
    pub use margin_core::SqliteCatalog;

    // Embeddings and search
    pub use margin_embeddings::{Embedder, EmbeddingService, RetryPolicy, SimpleEmbedder};
    pub use margin_vectors::{RankedResult, SearchOptions};

    #[cfg(feature = "api")]
    pub use margin_embeddings::{ApiConfig, ApiEmbedder};

    // Graph
    pub use margin_graph::{
        EdgeType, GraphConfig, GraphEdge, GraphNode, GraphStats, KnowledgeGraph, NodeSubgraph,
        NodeType,
    };

    // Ranking
    pub use margin_rank::{
        DurationPreference, RankingConfig, RecommendOptions, RecommendedItem, ReasonWriter,
        UserProfile,
    };

    #[cfg(feature = "llm")]
    pub use margin_rank::{ChatConfig, ChatReasons};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
