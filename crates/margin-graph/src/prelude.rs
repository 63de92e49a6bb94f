//! Margin Graph Prelude - convenient imports for common usage.
//!
//! ```rust
//! use margin_graph::prelude::*;
//! ```

pub use crate::builder::GraphBuilder;
pub use crate::cache::{GraphCache, InMemoryGraphCache};
pub use crate::config::{EdgeWeights, GraphConfig};
pub use crate::error::{GraphError, GraphResult};
pub use crate::layout::LayoutConfig;
pub use crate::model::{
    EdgeType, EdgeWeight, GraphEdge, GraphNode, KnowledgeGraph, NodeProps, NodeType,
};
pub use crate::query::GraphQueryEngine;
pub use crate::snapshot::{GraphStats, NodeSubgraph};

pub use margin_core::{Catalog, CatalogSource, InMemoryCatalog, JsonCatalog};
