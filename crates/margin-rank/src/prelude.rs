//! Margin Rank Prelude - convenient imports for common usage.
//!
//! ```rust
//! use margin_rank::prelude::*;
//! ```

pub use crate::candidate::Candidate;
pub use crate::config::{PopularityScale, RankingConfig, RankingWeights};
pub use crate::profile::{DurationPreference, FavoriteTopic, UserProfile};
pub use crate::reason::{ReasonContext, ReasonWriter, TemplateReasons};
pub use crate::recommender::{RecommendOptions, RecommendedItem, Recommender};
pub use crate::signals::{Signal, Signals};
pub use crate::{RankError, RankResult};

#[cfg(feature = "llm")]
pub use crate::chat::{ChatConfig, ChatReasons};

pub use margin_core::{CatalogSource, EntityKind, InMemoryCatalog, ItemMetadata};
pub use margin_embeddings::EmbeddingService;
