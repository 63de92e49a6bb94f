//! Recommend catalog items for a listener profile.

use anyhow::Result;
use colored::Colorize;
use margin::core::EntityKind;
use margin::rank::{DurationPreference, RecommendOptions, UserProfile};
use margin::KnowledgeEngine;

use super::{open_indexed_engine, Output};
use crate::config::Loaded;

pub struct Request {
    pub topics: Vec<String>,
    pub kind: EntityKind,
    pub mood: Option<String>,
    pub tone: Option<String>,
    pub duration: Option<DurationPreference>,
    pub listened: Vec<String>,
    pub limit: usize,
}

impl Request {
    /// Topics keep their command-line order; earlier topics get higher affinity.
    fn profile(&self) -> UserProfile {
        let count = self.topics.len() as f32;
        let mut profile = self
            .topics
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .enumerate()
            .fold(UserProfile::new(), |profile, (i, topic)| {
                profile.with_topic(topic, 1.0 - i as f32 / (2.0 * count))
            });
        if let Some(mood) = &self.mood {
            profile = profile.with_mood(mood.clone());
        }
        if let Some(tone) = &self.tone {
            profile = profile.with_tone(tone.clone());
        }
        if let Some(duration) = self.duration {
            profile = profile.with_duration(duration);
        }
        profile.with_history(self.listened.clone())
    }

    fn options(&self) -> RecommendOptions {
        let options = RecommendOptions::default().with_limit(self.limit);
        if self.listened.is_empty() {
            options
        } else {
            options.excluding_listened()
        }
    }
}

pub async fn run(loaded: &Loaded, output: Output, request: Request) -> Result<()> {
    let engine = with_reasons(open_indexed_engine(loaded).await?, loaded)?;
    let profile = request.profile();

    let items = engine
        .recommend(&profile, request.kind, &request.options())
        .await?;
    if output.json(&items)? {
        return Ok(());
    }

    if items.is_empty() {
        println!("{} No {}s in the catalog to recommend", "•".yellow(), request.kind);
        return Ok(());
    }

    println!(
        "{} Recommended {}s for {}:",
        "→".blue(),
        request.kind,
        profile.preference_text().cyan()
    );
    println!();

    for (i, item) in items.iter().enumerate() {
        let rank = format!("{}.", i + 1);
        println!(
            "  {} {} {}",
            rank.blue(),
            item.title.white().bold(),
            format!("({:.3})", item.score).dimmed()
        );
        println!("      {}", item.reason.italic());
        println!(
            "      {}",
            format!(
                "similarity {:.2}  recency {:.2}  popularity {:.2}  topics {:.2}",
                item.signals.similarity,
                item.signals.recency,
                item.signals.popularity,
                item.signals.topic_match
            )
            .dimmed()
        );
    }

    println!();
    println!("{} {} recommendations", "✓".green(), items.len().to_string().cyan());
    Ok(())
}

/// Chat-written reasons when the `llm` feature is on and a key is available.
#[cfg(feature = "llm")]
fn with_reasons(engine: KnowledgeEngine, loaded: &Loaded) -> Result<KnowledgeEngine> {
    use margin::rank::{ChatConfig, ChatReasons};
    use std::sync::Arc;

    match std::env::var(&loaded.config.embedding.api_key_env) {
        Ok(key) => {
            let reasons = ChatReasons::new(ChatConfig::openai(key))?;
            Ok(engine.with_reasons(Arc::new(reasons)))
        }
        Err(_) => {
            tracing::debug!("no completion key, using template reasons");
            Ok(engine)
        }
    }
}

#[cfg(not(feature = "llm"))]
fn with_reasons(engine: KnowledgeEngine, _loaded: &Loaded) -> Result<KnowledgeEngine> {
    Ok(engine)
}
