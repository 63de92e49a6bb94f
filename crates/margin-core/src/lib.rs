//! # Margin Core
//!
//! Core domain types shared by every Margin crate:
//!
//! - **Catalog** - canonical episodes, books, speakers and quotes plus the
//!   join tables relating them, as read from the datastore
//! - **CatalogSource** - the read-only datastore seam (in-memory, JSON file,
//!   and SQLite behind the `sqlite` feature)
//! - **ItemMetadata** - typed per-kind metadata for indexed items
//! - **OriginalRef** - typed back-reference from derived data into the catalog
//!
//! ## Quick Start
//!
//! ```rust
//! use margin_core::prelude::*;
//!
//! let catalog = Catalog::from_json(r#"{"books":[{"id":"b1","title":"Deep Work"}]}"#).unwrap();
//! let book = catalog.resolve(&OriginalRef::new(EntityKind::Book, "b1")).unwrap();
//! assert_eq!(book.title(), "Deep Work");
//! ```

pub mod catalog;
pub mod error;
pub mod metadata;
pub mod prelude;
pub mod source;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use catalog::{
    Book, Catalog, EntityRef, Episode, EpisodeBook, EpisodeSpeaker, Quote, Speaker, SpeakerRole,
};
pub use error::{CatalogError, CatalogResult};
pub use metadata::ItemMetadata;
pub use source::{CatalogSource, InMemoryCatalog, JsonCatalog};
pub use types::{slugify, EntityKind, OriginalRef, Position, UnknownKind};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCatalog;
