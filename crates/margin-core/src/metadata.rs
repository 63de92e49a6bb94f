//! Typed metadata carried alongside indexed items and recommendations.

use crate::catalog::{Book, Episode, Quote, Speaker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-kind metadata for an indexed or recommended entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemMetadata {
    Episode {
        title: String,
        topics: Vec<String>,
        duration_minutes: Option<u32>,
        published_at: Option<DateTime<Utc>>,
    },
    Book {
        title: String,
        author: Option<String>,
        category: Option<String>,
    },
    Speaker {
        name: String,
        expertise: Vec<String>,
    },
    Quote {
        episode_id: Option<String>,
        book_id: Option<String>,
        speaker_id: Option<String>,
    },
    #[default]
    None,
}

impl ItemMetadata {
    /// Human-readable title, when the metadata carries one.
    pub fn title(&self) -> Option<&str> {
        match self {
            ItemMetadata::Episode { title, .. } | ItemMetadata::Book { title, .. } => Some(title),
            ItemMetadata::Speaker { name, .. } => Some(name),
            ItemMetadata::Quote { .. } | ItemMetadata::None => None,
        }
    }
}

impl From<&Episode> for ItemMetadata {
    fn from(episode: &Episode) -> Self {
        ItemMetadata::Episode {
            title: episode.title.clone(),
            topics: episode.topics.clone(),
            duration_minutes: episode.duration_minutes,
            published_at: episode.published_at,
        }
    }
}

impl From<&Book> for ItemMetadata {
    fn from(book: &Book) -> Self {
        ItemMetadata::Book {
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
        }
    }
}

impl From<&Speaker> for ItemMetadata {
    fn from(speaker: &Speaker) -> Self {
        ItemMetadata::Speaker {
            name: speaker.name.clone(),
            expertise: speaker.expertise.clone(),
        }
    }
}

impl From<&Quote> for ItemMetadata {
    fn from(quote: &Quote) -> Self {
        ItemMetadata::Quote {
            episode_id: quote.episode_id.clone(),
            book_id: quote.book_id.clone(),
            speaker_id: quote.speaker_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let meta = ItemMetadata::from(&Book {
            id: "b1".into(),
            title: "Deep Work".into(),
            author: Some("Cal Newport".into()),
            ..Default::default()
        });
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["kind"], "book");
        assert_eq!(json["author"], "Cal Newport");
        assert_eq!(meta.title(), Some("Deep Work"));
    }

    #[test]
    fn none_has_no_title() {
        assert_eq!(ItemMetadata::None.title(), None);
    }
}
