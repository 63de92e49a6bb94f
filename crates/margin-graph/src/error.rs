//! Error types for graph queries.

use margin_core::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The catalog could not be read during a rebuild.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type GraphResult<T> = Result<T, GraphError>;
