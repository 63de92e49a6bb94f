//! Human-readable explanations attached to recommendations.

use crate::candidate::Candidate;
use crate::profile::UserProfile;
use crate::signals::{Signal, Signals};
use crate::RankResult;
use async_trait::async_trait;
use margin_core::EntityKind;

/// Everything a writer may use to explain one recommendation.
#[derive(Debug, Clone)]
pub struct ReasonContext<'a> {
    pub profile: &'a UserProfile,
    pub candidate: &'a Candidate,
    pub signals: Signals,
    pub dominant: Signal,
    /// Favorite topic slugs found in the candidate's tags.
    pub matched_topics: Vec<String>,
}

/// Writes the `reason` text of a recommendation.
///
/// Failures are never fatal: the recommender falls back to
/// [`TemplateReasons`] whenever a writer errors or returns blank text.
#[async_trait]
pub trait ReasonWriter: Send + Sync {
    fn name(&self) -> &str;

    async fn write_reason(&self, ctx: &ReasonContext<'_>) -> RankResult<String>;
}

/// Deterministic, template-based reasons.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateReasons;

impl TemplateReasons {
    pub fn render(ctx: &ReasonContext<'_>) -> String {
        match ctx.dominant {
            Signal::Similarity => {
                let topics: Vec<&str> = ctx
                    .profile
                    .topics_by_affinity()
                    .into_iter()
                    .take(2)
                    .map(|t| t.topic.trim())
                    .collect();
                if topics.is_empty() {
                    "Closely matches your listening preferences".to_string()
                } else {
                    format!("Closely matches your interest in {}", topics.join(" and "))
                }
            }
            Signal::TopicMatch => {
                let topics: Vec<String> = ctx.matched_topics.iter().map(|s| s.replace('-', " ")).collect();
                format!("Covers topics you follow: {}", topics.join(", "))
            }
            Signal::Recency => match ctx.candidate.kind {
                EntityKind::Book => "A recently published book".to_string(),
                _ => "Recently published".to_string(),
            },
            Signal::Popularity => match ctx.candidate.kind {
                EntityKind::Episode => "Popular with listeners".to_string(),
                EntityKind::Book => "Frequently mentioned across episodes".to_string(),
                EntityKind::Speaker => "Appears in many episodes".to_string(),
                EntityKind::Quote => "Often shared".to_string(),
            },
        }
    }
}

#[async_trait]
impl ReasonWriter for TemplateReasons {
    fn name(&self) -> &str {
        "template"
    }

    async fn write_reason(&self, ctx: &ReasonContext<'_>) -> RankResult<String> {
        Ok(Self::render(ctx))
    }
}
