//! Canonical entities and the catalog snapshot read from the datastore.
//!
//! The catalog is a read-only view: this engine never writes canonical data.
//! Relations (episode↔book, episode↔speaker) are carried as join rows, the
//! way the relational store keeps them.

use crate::types::{slugify, EntityKind, OriginalRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A long-form audio episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Topics extracted from the transcript.
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub listen_count: u64,
}

/// A book mentioned in one or more episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Concepts associated with the book by extraction.
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Set when the author also appears as a speaker.
    #[serde(default)]
    pub author_speaker_id: Option<String>,
}

/// A host or guest appearing in episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub expertise: Vec<String>,
}

/// A quote extracted from an episode, optionally attributed to a book or speaker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub text_ar: Option<String>,
    #[serde(default)]
    pub episode_id: Option<String>,
    #[serde(default)]
    pub book_id: Option<String>,
    #[serde(default)]
    pub speaker_id: Option<String>,
}

impl Episode {
    /// Text embedded for similarity: title, description and topics.
    pub fn content_text(&self) -> String {
        join_text([self.title.as_str(), self.description.as_str(), self.topics.join(", ").as_str()])
    }
}

impl Book {
    pub fn content_text(&self) -> String {
        join_text([
            self.title.as_str(),
            self.author.as_deref().unwrap_or_default(),
            self.description.as_str(),
            self.category.as_deref().unwrap_or_default(),
            self.concepts.join(", ").as_str(),
        ])
    }
}

impl Speaker {
    pub fn content_text(&self) -> String {
        join_text([self.name.as_str(), self.bio.as_str(), self.expertise.join(", ").as_str()])
    }
}

impl Quote {
    pub fn content_text(&self) -> String {
        self.text.trim().to_string()
    }
}

fn join_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(". ")
}

/// Join row: an episode mentions a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeBook {
    pub episode_id: String,
    pub book_id: String,
    /// Explicit mention by a speaker, as opposed to inferred co-occurrence.
    #[serde(default = "default_explicit")]
    pub explicit: bool,
}

fn default_explicit() -> bool {
    true
}

/// Role a speaker plays in an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    Host,
    #[default]
    Guest,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerRole::Host => "host",
            SpeakerRole::Guest => "guest",
        }
    }
}

/// Join row: a speaker participates in an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSpeaker {
    pub episode_id: String,
    pub speaker_id: String,
    #[serde(default)]
    pub role: SpeakerRole,
}

/// Borrowed view of a resolved catalog entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Episode(&'a Episode),
    Book(&'a Book),
    Speaker(&'a Speaker),
    Quote(&'a Quote),
}

impl<'a> EntityRef<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Episode(_) => EntityKind::Episode,
            EntityRef::Book(_) => EntityKind::Book,
            EntityRef::Speaker(_) => EntityKind::Speaker,
            EntityRef::Quote(_) => EntityKind::Quote,
        }
    }

    /// Display title of the entity.
    pub fn title(&self) -> &'a str {
        match self {
            EntityRef::Episode(e) => &e.title,
            EntityRef::Book(b) => &b.title,
            EntityRef::Speaker(s) => &s.name,
            EntityRef::Quote(q) => &q.text,
        }
    }
}

/// Snapshot of canonical entities and their join tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub speakers: Vec<Speaker>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(default)]
    pub episode_books: Vec<EpisodeBook>,
    #[serde(default)]
    pub episode_speakers: Vec<EpisodeSpeaker>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from its JSON representation.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Total number of canonical entities.
    pub fn entity_count(&self) -> usize {
        self.episodes.len() + self.books.len() + self.speakers.len() + self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }

    pub fn episode(&self, id: &str) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.id == id)
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn speaker(&self, id: &str) -> Option<&Speaker> {
        self.speakers.iter().find(|s| s.id == id)
    }

    pub fn quote(&self, id: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.id == id)
    }

    /// Look up the entity a back-reference points at.
    pub fn resolve(&self, original: &OriginalRef) -> Option<EntityRef<'_>> {
        let id = original.id.as_str();
        match original.kind {
            EntityKind::Episode => self.episode(id).map(EntityRef::Episode),
            EntityKind::Book => self.book(id).map(EntityRef::Book),
            EntityKind::Speaker => self.speaker(id).map(EntityRef::Speaker),
            EntityKind::Quote => self.quote(id).map(EntityRef::Quote),
        }
    }

    /// Books mentioned in an episode.
    pub fn books_for_episode(&self, episode_id: &str) -> Vec<&Book> {
        self.episode_books
            .iter()
            .filter(|rel| rel.episode_id == episode_id)
            .filter_map(|rel| self.book(&rel.book_id))
            .collect()
    }

    /// Speakers appearing in an episode.
    pub fn speakers_for_episode(&self, episode_id: &str) -> Vec<&Speaker> {
        self.episode_speakers
            .iter()
            .filter(|rel| rel.episode_id == episode_id)
            .filter_map(|rel| self.speaker(&rel.speaker_id))
            .collect()
    }

    /// Number of episodes mentioning each book, keyed by book id.
    pub fn book_mention_counts(&self) -> HashMap<&str, usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for rel in &self.episode_books {
            *counts.entry(rel.book_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of episode appearances per speaker, keyed by speaker id.
    pub fn speaker_appearance_counts(&self) -> HashMap<&str, usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for rel in &self.episode_speakers {
            *counts.entry(rel.speaker_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of books plus speakers related to each episode, keyed by episode id.
    pub fn episode_relation_counts(&self) -> HashMap<&str, usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for rel in &self.episode_books {
            *counts.entry(rel.episode_id.as_str()).or_insert(0) += 1;
        }
        for rel in &self.episode_speakers {
            *counts.entry(rel.episode_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct topic slugs across all episodes, in first-seen order.
    pub fn topic_slugs(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for topic in self.episodes.iter().flat_map(|e| e.topics.iter()) {
            let slug = slugify(topic);
            if !slug.is_empty() && !seen.contains(&slug) {
                seen.push(slug);
            }
        }
        seen
    }
}
