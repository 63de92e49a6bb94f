//! Items that can be recommended.

use chrono::{DateTime, Utc};
use margin_core::{Catalog, EntityKind, ItemMetadata};

/// A recommendable entity with the inputs every ranking signal needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    /// Text compared against the preference embedding.
    pub content: String,
    /// Labels matched literally against favorite topics.
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Raw input of the popularity bonus.
    pub related_count: f32,
    pub metadata: ItemMetadata,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        kind: EntityKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            published_at: None,
            related_count: 0.0,
            metadata: ItemMetadata::None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    pub fn with_related_count(mut self, related_count: f32) -> Self {
        self.related_count = related_count;
        self
    }

    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn content_text(&self) -> &str {
        &self.content
    }

    /// Every catalog entity of `kind`, in catalog order.
    pub fn from_catalog(catalog: &Catalog, kind: EntityKind) -> Vec<Candidate> {
        match kind {
            EntityKind::Episode => {
                let relations = catalog.episode_relation_counts();
                catalog
                    .episodes
                    .iter()
                    .map(|e| {
                        let related = relations.get(e.id.as_str()).copied().unwrap_or(0) as f32
                            + e.listen_count as f32 / 100.0;
                        Candidate {
                            id: e.id.clone(),
                            kind,
                            title: e.title.clone(),
                            content: e.content_text(),
                            tags: e.topics.clone(),
                            published_at: e.published_at,
                            related_count: related,
                            metadata: e.into(),
                        }
                    })
                    .collect()
            }
            EntityKind::Book => {
                let mentions = catalog.book_mention_counts();
                catalog
                    .books
                    .iter()
                    .map(|b| Candidate {
                        id: b.id.clone(),
                        kind,
                        title: b.title.clone(),
                        content: b.content_text(),
                        tags: b.concepts.iter().chain(b.category.iter()).cloned().collect(),
                        published_at: b.published_at,
                        related_count: mentions.get(b.id.as_str()).copied().unwrap_or(0) as f32,
                        metadata: b.into(),
                    })
                    .collect()
            }
            EntityKind::Speaker => {
                let appearances = catalog.speaker_appearance_counts();
                catalog
                    .speakers
                    .iter()
                    .map(|s| Candidate {
                        id: s.id.clone(),
                        kind,
                        title: s.name.clone(),
                        content: s.content_text(),
                        tags: s.expertise.clone(),
                        published_at: None,
                        related_count: appearances.get(s.id.as_str()).copied().unwrap_or(0) as f32,
                        metadata: s.into(),
                    })
                    .collect()
            }
            EntityKind::Quote => catalog
                .quotes
                .iter()
                .map(|q| Candidate {
                    id: q.id.clone(),
                    kind,
                    title: q.text.clone(),
                    content: q.content_text(),
                    tags: Vec::new(),
                    published_at: None,
                    related_count: 0.0,
                    metadata: q.into(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use margin_core::{Book, Episode, EpisodeBook, EpisodeSpeaker, Speaker, SpeakerRole};

    fn catalog() -> Catalog {
        Catalog {
            episodes: vec![Episode {
                id: "e1".into(),
                title: "On Habits".into(),
                topics: vec!["habits".into()],
                listen_count: 250,
                ..Default::default()
            }],
            books: vec![
                Book {
                    id: "b1".into(),
                    title: "Atomic Habits".into(),
                    category: Some("self-help".into()),
                    concepts: vec!["identity".into()],
                    ..Default::default()
                },
                Book {
                    id: "b2".into(),
                    title: "Unmentioned".into(),
                    ..Default::default()
                },
            ],
            speakers: vec![Speaker {
                id: "s1".into(),
                name: "James".into(),
                expertise: vec!["behavior".into()],
                ..Default::default()
            }],
            episode_books: vec![EpisodeBook {
                episode_id: "e1".into(),
                book_id: "b1".into(),
                explicit: true,
            }],
            episode_speakers: vec![EpisodeSpeaker {
                episode_id: "e1".into(),
                speaker_id: "s1".into(),
                role: SpeakerRole::Host,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn episode_popularity_counts_relations_and_listens() {
        let episodes = Candidate::from_catalog(&catalog(), EntityKind::Episode);
        assert_eq!(episodes.len(), 1);
        assert!((episodes[0].related_count - 4.5).abs() < 1e-6);
        assert_eq!(episodes[0].tags, vec!["habits"]);
        assert_eq!(episodes[0].content_text(), "On Habits. habits");
    }

    #[test]
    fn book_tags_include_concepts_and_category() {
        let books = Candidate::from_catalog(&catalog(), EntityKind::Book);
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].tags, vec!["identity", "self-help"]);
        assert_eq!(books[0].related_count, 1.0);
        assert_eq!(books[1].related_count, 0.0);
        assert_eq!(books[0].metadata.title(), Some("Atomic Habits"));
    }

    #[test]
    fn speakers_use_name_as_title() {
        let speakers = Candidate::from_catalog(&catalog(), EntityKind::Speaker);
        assert_eq!(speakers[0].title, "James");
        assert_eq!(speakers[0].related_count, 1.0);
    }
}
