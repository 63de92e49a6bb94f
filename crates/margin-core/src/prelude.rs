//! Margin Core Prelude - convenient imports for common usage.
//!
//! ```rust
//! use margin_core::prelude::*;
//! ```

pub use crate::catalog::{
    Book, Catalog, EntityRef, Episode, EpisodeBook, EpisodeSpeaker, Quote, Speaker, SpeakerRole,
};
pub use crate::error::{CatalogError, CatalogResult};
pub use crate::metadata::ItemMetadata;
pub use crate::source::{CatalogSource, InMemoryCatalog, JsonCatalog};
pub use crate::types::{slugify, EntityKind, OriginalRef, Position};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteCatalog;
