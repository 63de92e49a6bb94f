//! Listener profiles and the preference text they embed to.

use margin_core::slugify;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Preference text used when a profile expresses no preferences at all.
pub const DEFAULT_PREFERENCE: &str =
    "insightful long-form conversations about ideas, books, personal growth and learning";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteTopic {
    pub topic: String,
    /// Relative interest; higher sorts first.
    #[serde(default = "default_affinity")]
    pub affinity: f32,
}

fn default_affinity() -> f32 {
    1.0
}

impl FavoriteTopic {
    pub fn new(topic: impl Into<String>, affinity: f32) -> Self {
        Self {
            topic: topic.into(),
            affinity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPreference {
    Short,
    Medium,
    Long,
}

impl DurationPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationPreference::Short => "short",
            DurationPreference::Medium => "medium",
            DurationPreference::Long => "long",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            DurationPreference::Short => "short episodes under 30 minutes",
            DurationPreference::Medium => "medium-length episodes of 30 to 60 minutes",
            DurationPreference::Long => "long, in-depth episodes over an hour",
        }
    }
}

impl fmt::Display for DurationPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(DurationPreference::Short),
            "medium" => Ok(DurationPreference::Medium),
            "long" => Ok(DurationPreference::Long),
            other => Err(format!("unknown duration preference: {}", other)),
        }
    }
}

/// What a listener likes. Read-only input to ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub favorite_topics: Vec<FavoriteTopic>,
    pub preferred_mood: Option<String>,
    pub preferred_tone: Option<String>,
    pub preferred_duration: Option<DurationPreference>,
    /// Episode ids already listened to.
    pub listening_history: Vec<String>,
    pub engagement_score: f32,
}

impl UserProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topic(mut self, topic: impl Into<String>, affinity: f32) -> Self {
        self.favorite_topics.push(FavoriteTopic::new(topic, affinity));
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.preferred_mood = Some(mood.into());
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.preferred_tone = Some(tone.into());
        self
    }

    pub fn with_duration(mut self, duration: DurationPreference) -> Self {
        self.preferred_duration = Some(duration);
        self
    }

    pub fn with_history(mut self, episode_ids: Vec<String>) -> Self {
        self.listening_history = episode_ids;
        self
    }

    /// Non-blank favorite topics, highest affinity first; ties keep profile order.
    pub fn topics_by_affinity(&self) -> Vec<&FavoriteTopic> {
        let mut topics: Vec<&FavoriteTopic> = self
            .favorite_topics
            .iter()
            .filter(|t| !t.topic.trim().is_empty())
            .collect();
        topics.sort_by(|a, b| {
            b.affinity
                .partial_cmp(&a.affinity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        topics
    }

    /// Distinct slugs of the favorite topics, for literal tag matching.
    pub fn topic_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = Vec::new();
        for t in self.topics_by_affinity() {
            let slug = slugify(&t.topic);
            if !slug.is_empty() && !slugs.contains(&slug) {
                slugs.push(slug);
            }
        }
        slugs
    }

    pub fn has_listened(&self, episode_id: &str) -> bool {
        self.listening_history.iter().any(|id| id == episode_id)
    }

    /// Single sentence describing the listener's taste, embedded once per request.
    ///
    /// Falls back to [`DEFAULT_PREFERENCE`] when the profile is empty.
    pub fn preference_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        let topics: Vec<&str> = self
            .topics_by_affinity()
            .into_iter()
            .map(|t| t.topic.trim())
            .collect();
        if !topics.is_empty() {
            parts.push(topics.join(", "));
        }
        if let Some(tone) = non_blank(&self.preferred_tone) {
            parts.push(format!("{} tone", tone));
        }
        if let Some(mood) = non_blank(&self.preferred_mood) {
            parts.push(format!("{} mood", mood));
        }
        if let Some(duration) = self.preferred_duration {
            parts.push(duration.describe().to_string());
        }

        if parts.is_empty() {
            DEFAULT_PREFERENCE.to_string()
        } else {
            parts.join(". ")
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
