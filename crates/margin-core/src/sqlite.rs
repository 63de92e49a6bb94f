//! SQLite-backed catalog source.
//!
//! Reads canonical entities and join tables from a relational database.
//! List-valued columns (topics, concepts, expertise) are stored as JSON
//! arrays; timestamps as RFC 3339 text.

#![cfg(feature = "sqlite")]

use crate::catalog::{Book, Catalog, Episode, EpisodeBook, EpisodeSpeaker, Quote, Speaker, SpeakerRole};
use crate::error::{CatalogError, CatalogResult};
use crate::source::CatalogSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS episodes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    title_ar TEXT,
    description TEXT NOT NULL DEFAULT '',
    topics TEXT NOT NULL DEFAULT '[]',
    mood TEXT,
    tone TEXT,
    duration_minutes INTEGER,
    published_at TEXT,
    listen_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    title_ar TEXT,
    author TEXT,
    description TEXT NOT NULL DEFAULT '',
    category TEXT,
    concepts TEXT NOT NULL DEFAULT '[]',
    published_at TEXT,
    author_speaker_id TEXT
);

CREATE TABLE IF NOT EXISTS speakers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    name_ar TEXT,
    bio TEXT NOT NULL DEFAULT '',
    expertise TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS quotes (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    text_ar TEXT,
    episode_id TEXT,
    book_id TEXT,
    speaker_id TEXT
);

CREATE TABLE IF NOT EXISTS episode_books (
    episode_id TEXT NOT NULL,
    book_id TEXT NOT NULL,
    explicit INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (episode_id, book_id)
);

CREATE TABLE IF NOT EXISTS episode_speakers (
    episode_id TEXT NOT NULL,
    speaker_id TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'guest',
    PRIMARY KEY (episode_id, speaker_id)
);

CREATE INDEX IF NOT EXISTS idx_episode_books_book ON episode_books(book_id);
CREATE INDEX IF NOT EXISTS idx_episode_speakers_speaker ON episode_speakers(speaker_id);
"#;

/// Catalog source reading from a SQLite database.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open a file-backed database.
    pub fn open<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an empty in-memory database with the catalog schema.
    pub fn new_in_memory() -> CatalogResult<Self> {
        let catalog = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        catalog.create_schema()?;
        Ok(catalog)
    }

    /// Create the catalog tables if they do not exist.
    pub fn create_schema(&self) -> CatalogResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Write a catalog into the database, replacing rows with the same ids.
    ///
    /// Used to seed fixtures; the engine itself never writes canonical data.
    pub fn import(&self, catalog: &Catalog) -> CatalogResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for e in &catalog.episodes {
            tx.execute(
                "INSERT OR REPLACE INTO episodes (id, title, title_ar, description, topics, mood, tone, duration_minutes, published_at, listen_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    e.id,
                    e.title,
                    e.title_ar,
                    e.description,
                    serde_json::to_string(&e.topics)?,
                    e.mood,
                    e.tone,
                    e.duration_minutes,
                    e.published_at.map(|d| d.to_rfc3339()),
                    e.listen_count as i64,
                ],
            )?;
        }
        for b in &catalog.books {
            tx.execute(
                "INSERT OR REPLACE INTO books (id, title, title_ar, author, description, category, concepts, published_at, author_speaker_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    b.id,
                    b.title,
                    b.title_ar,
                    b.author,
                    b.description,
                    b.category,
                    serde_json::to_string(&b.concepts)?,
                    b.published_at.map(|d| d.to_rfc3339()),
                    b.author_speaker_id,
                ],
            )?;
        }
        for s in &catalog.speakers {
            tx.execute(
                "INSERT OR REPLACE INTO speakers (id, name, name_ar, bio, expertise) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![s.id, s.name, s.name_ar, s.bio, serde_json::to_string(&s.expertise)?],
            )?;
        }
        for q in &catalog.quotes {
            tx.execute(
                "INSERT OR REPLACE INTO quotes (id, text, text_ar, episode_id, book_id, speaker_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![q.id, q.text, q.text_ar, q.episode_id, q.book_id, q.speaker_id],
            )?;
        }
        for rel in &catalog.episode_books {
            tx.execute(
                "INSERT OR REPLACE INTO episode_books (episode_id, book_id, explicit) VALUES (?1, ?2, ?3)",
                params![rel.episode_id, rel.book_id, rel.explicit],
            )?;
        }
        for rel in &catalog.episode_speakers {
            tx.execute(
                "INSERT OR REPLACE INTO episode_speakers (episode_id, speaker_id, role) VALUES (?1, ?2, ?3)",
                params![rel.episode_id, rel.speaker_id, rel.role.as_str()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Number of rows in the episodes table, or `None` if the table is missing.
    pub fn episode_count(&self) -> CatalogResult<Option<usize>> {
        let conn = self.lock()?;
        let exists: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name='episodes'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }
        let count: usize = conn.query_row("SELECT COUNT(*) FROM episodes", [], |row| row.get(0))?;
        Ok(Some(count))
    }

    fn lock(&self) -> CatalogResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CatalogError::Unavailable(format!("Failed to acquire connection: {}", e)))
    }

    fn read_all(conn: &Connection) -> CatalogResult<Catalog> {
        let mut catalog = Catalog::new();

        let mut stmt = conn.prepare(
            "SELECT id, title, title_ar, description, topics, mood, tone, duration_minutes, published_at, listen_count
             FROM episodes ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                Episode {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    title_ar: row.get(2)?,
                    description: row.get(3)?,
                    topics: Vec::new(),
                    mood: row.get(5)?,
                    tone: row.get(6)?,
                    duration_minutes: row.get(7)?,
                    published_at: None,
                    listen_count: row.get::<_, i64>(9)?.max(0) as u64,
                },
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(8)?,
            ))
        })?;
        for row in rows {
            let (mut episode, topics, published_at) = row?;
            episode.topics = serde_json::from_str(&topics)?;
            episode.published_at = parse_timestamp(published_at.as_deref());
            catalog.episodes.push(episode);
        }

        let mut stmt = conn.prepare(
            "SELECT id, title, title_ar, author, description, category, concepts, published_at, author_speaker_id
             FROM books ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                Book {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    title_ar: row.get(2)?,
                    author: row.get(3)?,
                    description: row.get(4)?,
                    category: row.get(5)?,
                    concepts: Vec::new(),
                    published_at: None,
                    author_speaker_id: row.get(8)?,
                },
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;
        for row in rows {
            let (mut book, concepts, published_at) = row?;
            book.concepts = serde_json::from_str(&concepts)?;
            book.published_at = parse_timestamp(published_at.as_deref());
            catalog.books.push(book);
        }

        let mut stmt =
            conn.prepare("SELECT id, name, name_ar, bio, expertise FROM speakers ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                Speaker {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    name_ar: row.get(2)?,
                    bio: row.get(3)?,
                    expertise: Vec::new(),
                },
                row.get::<_, String>(4)?,
            ))
        })?;
        for row in rows {
            let (mut speaker, expertise) = row?;
            speaker.expertise = serde_json::from_str(&expertise)?;
            catalog.speakers.push(speaker);
        }

        let mut stmt = conn.prepare(
            "SELECT id, text, text_ar, episode_id, book_id, speaker_id FROM quotes ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Quote {
                id: row.get(0)?,
                text: row.get(1)?,
                text_ar: row.get(2)?,
                episode_id: row.get(3)?,
                book_id: row.get(4)?,
                speaker_id: row.get(5)?,
            })
        })?;
        for row in rows {
            catalog.quotes.push(row?);
        }

        let mut stmt =
            conn.prepare("SELECT episode_id, book_id, explicit FROM episode_books ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(EpisodeBook {
                episode_id: row.get(0)?,
                book_id: row.get(1)?,
                explicit: row.get(2)?,
            })
        })?;
        for row in rows {
            catalog.episode_books.push(row?);
        }

        let mut stmt = conn
            .prepare("SELECT episode_id, speaker_id, role FROM episode_speakers ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        for row in rows {
            let (episode_id, speaker_id, role) = row?;
            catalog.episode_speakers.push(EpisodeSpeaker {
                episode_id,
                speaker_id,
                role: string_to_role(&role),
            });
        }

        Ok(catalog)
    }
}

fn string_to_role(role: &str) -> SpeakerRole {
    match role {
        "host" => SpeakerRole::Host,
        _ => SpeakerRole::Guest,
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

#[async_trait]
impl CatalogSource for SqliteCatalog {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load_catalog(&self) -> CatalogResult<Catalog> {
        let conn = self.lock()?;
        let catalog = Self::read_all(&conn)?;
        tracing::debug!(entities = catalog.entity_count(), "loaded catalog from sqlite");
        Ok(catalog)
    }
}
