//! Ranking weights and heuristic scales.

use crate::{RankError, RankResult};
use margin_core::EntityKind;
use serde::{Deserialize, Serialize};

const WEIGHT_TOLERANCE: f32 = 1e-6;

/// Share of the final score each signal contributes. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub similarity: f32,
    pub recency: f32,
    pub popularity: f32,
    pub topic: f32,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            similarity: 0.6,
            recency: 0.15,
            popularity: 0.1,
            topic: 0.15,
        }
    }
}

impl RankingWeights {
    pub fn new(similarity: f32, recency: f32, popularity: f32, topic: f32) -> Self {
        Self {
            similarity,
            recency,
            popularity,
            topic,
        }
    }

    pub fn validate(&self) -> RankResult<()> {
        let all = [self.similarity, self.recency, self.popularity, self.topic];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RankError::InvalidInput(format!(
                "ranking weights must be finite and non-negative: {:?}",
                self
            )));
        }
        let sum: f32 = all.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(RankError::InvalidInput(format!(
                "ranking weights must sum to 1, got {}",
                sum
            )));
        }
        Ok(())
    }
}

/// Popularity bonus `min(related_count / k, cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopularityScale {
    pub k: f32,
    pub cap: f32,
}

impl PopularityScale {
    pub fn new(k: f32, cap: f32) -> Self {
        Self { k, cap }
    }

    pub fn apply(&self, related_count: f32) -> f32 {
        if self.k <= 0.0 || related_count <= 0.0 {
            return 0.0;
        }
        (related_count / self.k).min(self.cap)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub weights: RankingWeights,
    /// Applied to books + speakers + listens / 100.
    pub episode_popularity: PopularityScale,
    /// Applied to the number of episodes mentioning the book.
    pub book_popularity: PopularityScale,
    /// Applied to the number of episode appearances.
    pub speaker_popularity: PopularityScale,
    /// Age at which the recency bonus reaches zero.
    pub recency_window_days: f32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            episode_popularity: PopularityScale::new(10.0, 0.3),
            book_popularity: PopularityScale::new(10.0, 0.3),
            speaker_popularity: PopularityScale::new(5.0, 0.3),
            recency_window_days: 365.0,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> RankResult<()> {
        self.weights.validate()?;
        if !(self.recency_window_days > 0.0) {
            return Err(RankError::InvalidInput(format!(
                "recency window must be positive, got {}",
                self.recency_window_days
            )));
        }
        Ok(())
    }

    pub fn popularity_for(&self, kind: EntityKind) -> PopularityScale {
        match kind {
            EntityKind::Episode | EntityKind::Quote => self.episode_popularity,
            EntityKind::Book => self.book_popularity,
            EntityKind::Speaker => self.speaker_popularity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_valid() {
        RankingConfig::default().validate().unwrap();
    }

    #[test]
    fn weights_must_sum_to_one() {
        let err = RankingWeights::new(0.7, 0.2, 0.2, 0.0).validate();
        assert!(matches!(err, Err(RankError::InvalidInput(_))));

        RankingWeights::new(0.7, 0.3, 0.0, 0.0).validate().unwrap();
        RankingWeights::new(1.0, 0.0, 0.0, 0.0).validate().unwrap();
    }

    #[test]
    fn negative_or_nan_weights_are_rejected() {
        assert!(RankingWeights::new(1.2, -0.2, 0.0, 0.0).validate().is_err());
        assert!(RankingWeights::new(f32::NAN, 0.5, 0.5, 0.0).validate().is_err());
    }

    #[test]
    fn popularity_is_capped() {
        let books = RankingConfig::default().popularity_for(EntityKind::Book);
        assert_eq!(books.apply(0.0), 0.0);
        assert!((books.apply(2.0) - 0.2).abs() < 1e-6);
        assert_eq!(books.apply(50.0), 0.3);

        let speakers = RankingConfig::default().popularity_for(EntityKind::Speaker);
        assert!((speakers.apply(1.0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn partial_toml_like_config_keeps_defaults() {
        let config: RankingConfig =
            serde_json::from_str(r#"{"weights": {"similarity": 0.7, "recency": 0.1}}"#).unwrap();
        assert_eq!(config.weights.popularity, 0.1);
        assert_eq!(config.recency_window_days, 365.0);
        config.validate().unwrap();
    }
}
