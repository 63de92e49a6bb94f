//! # Margin Rank
//!
//! Personalized recommendations for the Margin knowledge retrieval engine.
//!
//! A [`UserProfile`] is turned into a single preference sentence and embedded
//! once. Candidates (episodes, books or speakers from the catalog) are scored
//! by a weighted blend of:
//!
//! | Signal       | Source                                              |
//! |--------------|-----------------------------------------------------|
//! | similarity   | cosine(preference, candidate content), clamped 0..1 |
//! | recency      | linear decay over the recency window                |
//! | popularity   | `min(related_count / k, cap)` per entity kind       |
//! | topic match  | share of favorite topics found in the tags          |
//!
//! Weights live in [`RankingConfig`] and must sum to 1.
//!
//! ```rust,ignore
//! use margin_rank::prelude::*;
//!
//! let recommender = Recommender::new(embeddings, source);
//! let profile = UserProfile::new().with_topic("habits", 1.0);
//! for item in recommender
//!     .recommend(&profile, EntityKind::Book, &RecommendOptions::default())
//!     .await?
//! {
//!     println!("{:.2} {} ({})", item.score, item.title, item.reason);
//! }
//! ```

pub mod candidate;
#[cfg(feature = "llm")]
pub mod chat;
pub mod config;
pub mod prelude;
pub mod profile;
pub mod reason;
pub mod recommender;
pub mod signals;

use margin_core::CatalogError;
use margin_embeddings::EmbeddingError;
use margin_vectors::VectorError;
use thiserror::Error;

/// Errors that can occur while ranking recommendations.
#[derive(Error, Debug)]
pub enum RankError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A reason writer failed. Never surfaces from ranking, which falls
    /// back to template reasons.
    #[error("Reason writer failed: {0}")]
    Reason(String),
}

/// Result type for ranking operations.
pub type RankResult<T> = Result<T, RankError>;

pub use candidate::Candidate;
#[cfg(feature = "llm")]
pub use chat::{ChatConfig, ChatReasons};
pub use config::{PopularityScale, RankingConfig, RankingWeights};
pub use profile::{DurationPreference, FavoriteTopic, UserProfile, DEFAULT_PREFERENCE};
pub use reason::{ReasonContext, ReasonWriter, TemplateReasons};
pub use recommender::{RecommendOptions, RecommendedItem, Recommender, DEFAULT_RECOMMEND_LIMIT};
pub use signals::{Signal, Signals};
