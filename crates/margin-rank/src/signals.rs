//! Per-candidate ranking signals.

use crate::config::RankingWeights;
use chrono::{DateTime, Utc};
use margin_core::slugify;
use serde::{Deserialize, Serialize};
use std::fmt;

const SECONDS_PER_DAY: f32 = 86_400.0;

/// Which signal contributed most to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Similarity,
    Recency,
    Popularity,
    TopicMatch,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Similarity => "similarity",
            Signal::Recency => "recency",
            Signal::Popularity => "popularity",
            Signal::TopicMatch => "topic_match",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw signal values, before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    /// Cosine similarity clamped to `[0, 1]`.
    pub similarity: f32,
    pub recency: f32,
    pub popularity: f32,
    pub topic_match: f32,
}

impl Signals {
    pub fn score(&self, weights: &RankingWeights) -> f32 {
        weights.similarity * self.similarity
            + weights.recency * self.recency
            + weights.popularity * self.popularity
            + weights.topic * self.topic_match
    }

    /// Largest weighted contribution; earlier signals win ties.
    pub fn dominant(&self, weights: &RankingWeights) -> Signal {
        let contributions = [
            (Signal::Similarity, weights.similarity * self.similarity),
            (Signal::Recency, weights.recency * self.recency),
            (Signal::Popularity, weights.popularity * self.popularity),
            (Signal::TopicMatch, weights.topic * self.topic_match),
        ];
        let mut best = contributions[0];
        for candidate in &contributions[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best.0
    }
}

/// Linear decay from 1 at publication to 0 after `window_days`. Undated items get 0.
pub fn recency(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>, window_days: f32) -> f32 {
    let Some(published_at) = published_at else {
        return 0.0;
    };
    let age_days = (now - published_at).num_seconds().max(0) as f32 / SECONDS_PER_DAY;
    (1.0 - age_days / window_days).max(0.0)
}

/// Favorite topic slugs found among `tags`, in profile order.
pub fn matched_topics(topic_slugs: &[String], tags: &[String]) -> Vec<String> {
    let tag_slugs: Vec<String> = tags.iter().map(|t| slugify(t)).collect();
    topic_slugs
        .iter()
        .filter(|slug| tag_slugs.contains(slug))
        .cloned()
        .collect()
}

/// Fraction of favorite topics present in `tags`; 0 without favorites.
pub fn topic_match(topic_slugs: &[String], tags: &[String]) -> f32 {
    if topic_slugs.is_empty() {
        return 0.0;
    }
    matched_topics(topic_slugs, tags).len() as f32 / topic_slugs.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn recency_decays_linearly() {
        assert_eq!(recency(None, now(), 365.0), 0.0);
        assert_eq!(recency(Some(now()), now(), 365.0), 1.0);

        let half = recency(Some(now() - Duration::days(182)), now(), 364.0);
        assert!((half - 0.5).abs() < 1e-4);

        assert_eq!(recency(Some(now() - Duration::days(400)), now(), 365.0), 0.0);
        // Future publication dates count as brand new.
        assert_eq!(recency(Some(now() + Duration::days(3)), now(), 365.0), 1.0);
    }

    #[test]
    fn topic_match_is_literal_and_fractional() {
        let topics = vec!["habits".to_string(), "deep-work".to_string()];
        assert_eq!(topic_match(&topics, &["Habits".to_string()]), 0.5);
        assert_eq!(
            topic_match(&topics, &["Deep Work".to_string(), "habits".to_string()]),
            1.0
        );
        assert_eq!(topic_match(&topics, &["habit".to_string()]), 0.0);
        assert_eq!(topic_match(&[], &["habits".to_string()]), 0.0);
    }

    #[test]
    fn dominant_signal_uses_weighted_contribution() {
        let weights = RankingWeights::default();
        let signals = Signals {
            similarity: 0.2,
            recency: 1.0,
            popularity: 0.0,
            topic_match: 0.0,
        };
        // 0.6 * 0.2 = 0.12 < 0.15 * 1.0
        assert_eq!(signals.dominant(&weights), Signal::Recency);
        assert!((signals.score(&weights) - 0.27).abs() < 1e-6);

        assert_eq!(Signals::default().dominant(&weights), Signal::Similarity);
    }
}
