//! Profile-driven recommendation ranking.
//!
//! Every candidate is scored by a weighted sum of four signals: embedding
//! similarity to the profile's preference text, recency, popularity and
//! literal topic match. Scores are sorted descending (stable) and the top
//! `limit` items get a reason from the configured [`ReasonWriter`].

use crate::candidate::Candidate;
use crate::config::RankingConfig;
use crate::profile::UserProfile;
use crate::reason::{ReasonContext, ReasonWriter, TemplateReasons};
use crate::signals::{self, Signals};
use crate::{RankError, RankResult};
use chrono::{DateTime, Utc};
use margin_core::{CatalogSource, EntityKind, ItemMetadata};
use margin_embeddings::{cosine_similarity, EmbeddingService};
use margin_vectors::SimilarityIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_RECOMMEND_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct RecommendOptions {
    pub limit: usize,
    /// Reference time for recency.
    pub now: DateTime<Utc>,
    /// Skip episodes in the profile's listening history.
    pub exclude_listened: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RECOMMEND_LIMIT,
            now: Utc::now(),
            exclude_listened: false,
        }
    }
}

impl RecommendOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn excluding_listened(mut self) -> Self {
        self.exclude_listened = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    pub score: f32,
    pub reason: String,
    pub signals: Signals,
    pub metadata: ItemMetadata,
}

struct Scored {
    candidate: Candidate,
    signals: Signals,
    score: f32,
}

pub struct Recommender {
    embeddings: EmbeddingService,
    index: Option<Arc<SimilarityIndex>>,
    source: Arc<dyn CatalogSource>,
    config: RankingConfig,
    reasons: Arc<dyn ReasonWriter>,
}

impl Recommender {
    pub fn new(embeddings: EmbeddingService, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            embeddings,
            index: None,
            source,
            config: RankingConfig::default(),
            reasons: Arc::new(TemplateReasons),
        }
    }

    /// Reuse embeddings already stored in `index` instead of re-embedding candidates.
    pub fn with_index(mut self, index: Arc<SimilarityIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_config(mut self, config: RankingConfig) -> RankResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_reasons(mut self, reasons: Arc<dyn ReasonWriter>) -> Self {
        self.reasons = reasons;
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Rank catalog entities of `kind` for `profile`.
    pub async fn recommend(
        &self,
        profile: &UserProfile,
        kind: EntityKind,
        options: &RecommendOptions,
    ) -> RankResult<Vec<RecommendedItem>> {
        check_limit(options.limit)?;

        let catalog = self.source.load_catalog().await?;
        let mut candidates = Candidate::from_catalog(&catalog, kind);
        if options.exclude_listened && kind == EntityKind::Episode {
            candidates.retain(|c| !profile.has_listened(&c.id));
        }
        self.rank(profile, candidates, options).await
    }

    /// Rank an explicit candidate list. Does not touch the datastore.
    pub async fn rank(
        &self,
        profile: &UserProfile,
        candidates: Vec<Candidate>,
        options: &RecommendOptions,
    ) -> RankResult<Vec<RecommendedItem>> {
        check_limit(options.limit)?;
        self.config.validate()?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let preference = self.embeddings.embed(&profile.preference_text()).await?;
        let vectors = self.candidate_vectors(&candidates, preference.len()).await?;

        let topic_slugs = profile.topic_slugs();
        let weights = self.config.weights;
        let mut scored = Vec::with_capacity(candidates.len());
        for (candidate, vector) in candidates.into_iter().zip(vectors) {
            let similarity = match vector {
                Some(v) => clamp_unit(cosine_similarity(&preference, &v)?),
                None => 0.0,
            };
            let signals = Signals {
                similarity,
                recency: signals::recency(
                    candidate.published_at,
                    options.now,
                    self.config.recency_window_days,
                ),
                popularity: self
                    .config
                    .popularity_for(candidate.kind)
                    .apply(candidate.related_count),
                topic_match: signals::topic_match(&topic_slugs, &candidate.tags),
            };
            scored.push(Scored {
                score: signals.score(&weights),
                candidate,
                signals,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(options.limit);

        let mut items = Vec::with_capacity(scored.len());
        for s in scored {
            let reason = self.reason_for(profile, &s, &topic_slugs).await;
            items.push(RecommendedItem {
                id: s.candidate.id,
                kind: s.candidate.kind,
                title: s.candidate.title,
                score: s.score,
                reason,
                signals: s.signals,
                metadata: s.candidate.metadata,
            });
        }

        tracing::debug!(
            results = items.len(),
            reasons = self.reasons.name(),
            "ranked recommendations"
        );
        Ok(items)
    }

    /// One vector per candidate: stored when the index has a compatible one,
    /// freshly batch-embedded otherwise. Blank content gets `None`.
    async fn candidate_vectors(
        &self,
        candidates: &[Candidate],
        dimension: usize,
    ) -> RankResult<Vec<Option<Vec<f32>>>> {
        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; candidates.len()];
        let mut missing: Vec<usize> = Vec::new();

        for (pos, candidate) in candidates.iter().enumerate() {
            if candidate.content_text().trim().is_empty() {
                continue;
            }
            let stored = match &self.index {
                Some(index) => index
                    .embedding_of(candidate.kind, &candidate.id)
                    .await?
                    .filter(|v| v.len() == dimension),
                None => None,
            };
            match stored {
                Some(v) => vectors[pos] = Some(v),
                None => missing.push(pos),
            }
        }

        if !missing.is_empty() {
            let texts: Vec<&str> = missing
                .iter()
                .map(|&pos| candidates[pos].content_text())
                .collect();
            let embedded = self.embeddings.embed_batch(&texts).await?;
            for (pos, v) in missing.into_iter().zip(embedded) {
                vectors[pos] = Some(v);
            }
        }
        Ok(vectors)
    }

    async fn reason_for(&self, profile: &UserProfile, scored: &Scored, topic_slugs: &[String]) -> String {
        let ctx = ReasonContext {
            profile,
            candidate: &scored.candidate,
            signals: scored.signals,
            dominant: scored.signals.dominant(&self.config.weights),
            matched_topics: signals::matched_topics(topic_slugs, &scored.candidate.tags),
        };
        match self.reasons.write_reason(&ctx).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!(writer = self.reasons.name(), id = %scored.candidate.id, "empty reason, using template");
                TemplateReasons::render(&ctx)
            }
            Err(e) => {
                tracing::warn!(writer = self.reasons.name(), id = %scored.candidate.id, error = %e, "reason writer failed, using template");
                TemplateReasons::render(&ctx)
            }
        }
    }
}

fn check_limit(limit: usize) -> RankResult<()> {
    if limit == 0 {
        return Err(RankError::InvalidInput("limit must be at least 1".to_string()));
    }
    Ok(())
}

/// NaN (zero-vector input) counts as no similarity.
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("embeddings", &self.embeddings)
            .field("index", &self.index.is_some())
            .field("source", &self.source.name())
            .field("config", &self.config)
            .field("reasons", &self.reasons.name())
            .finish()
    }
}
