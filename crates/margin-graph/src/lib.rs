//! # Margin Graph
//!
//! Knowledge graph over the Margin catalog: episodes, books, speakers and
//! quotes as typed nodes, plus topic and concept nodes derived from their
//! tags, joined by typed, weighted edges.
//!
//! [`GraphBuilder`] turns a [`margin_core::Catalog`] into an immutable
//! [`KnowledgeGraph`]. [`GraphQueryEngine`] caches the built graph for a TTL
//! and answers neighborhood, path, search and statistics queries over it.
//!
//! ```rust,ignore
//! use margin_graph::prelude::*;
//! use std::sync::Arc;
//!
//! let source = Arc::new(JsonCatalog::new("catalog.json"));
//! let engine = GraphQueryEngine::new(source, &GraphConfig::default());
//!
//! for (node, degree) in engine.get_most_connected_nodes(5, None).await? {
//!     println!("{} ({}): {}", node.label, node.node_type, degree);
//! }
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod layout;
pub mod model;
pub mod prelude;
pub mod query;
pub mod snapshot;

pub use builder::GraphBuilder;
pub use cache::{CacheEntry, GraphCache, InMemoryGraphCache};
pub use config::{EdgeWeights, GraphConfig};
pub use error::{GraphError, GraphResult};
pub use index::GraphIndex;
pub use layout::{apply_layout, LayoutConfig};
pub use model::{
    node_id, EdgeType, EdgeWeight, GraphEdge, GraphMetadata, GraphNode, KnowledgeGraph, NodeId,
    NodeProps, NodeType,
};
pub use query::GraphQueryEngine;
pub use snapshot::{GraphSnapshot, GraphStats, NodeSubgraph};
