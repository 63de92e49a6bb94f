//! Shared types used across all Margin crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of canonical entity held in the catalog and the similarity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Episode,
    Book,
    Speaker,
    Quote,
}

impl EntityKind {
    /// All entity kinds, in catalog order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Episode,
        EntityKind::Book,
        EntityKind::Speaker,
        EntityKind::Quote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Episode => "episode",
            EntityKind::Book => "book",
            EntityKind::Speaker => "speaker",
            EntityKind::Quote => "quote",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "episode" | "episodes" => Ok(EntityKind::Episode),
            "book" | "books" => Ok(EntityKind::Book),
            "speaker" | "speakers" => Ok(EntityKind::Speaker),
            "quote" | "quotes" => Ok(EntityKind::Quote),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Typed foreign key back into the catalog.
///
/// Graph nodes and index entries hold one of these instead of an untyped
/// `originalId` property; resolve it with [`crate::Catalog::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginalRef {
    pub kind: EntityKind,
    pub id: String,
}

impl OriginalRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// A position on the 2D visualization canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Lowercase, hyphen-separated identifier derived from a free-text label.
///
/// Used for topic and concept node ids and for literal topic matching.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;
    for c in label.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
