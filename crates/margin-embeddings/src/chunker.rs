//! Text chunking for embedding.
//!
//! Transcripts and long descriptions exceed provider input limits, so they
//! are split into overlapping word windows and embedded piecewise.

use crate::{EmbeddingError, EmbeddingResult};

/// Chunking configuration, in words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum chunk size in words.
    pub chunk_size: usize,
    /// Words shared between consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Create config for short chunks (quotes, titles).
    pub fn short() -> Self {
        Self::new(64, 8)
    }

    /// Create config for long chunks (transcript sections).
    pub fn long() -> Self {
        Self::new(1000, 100)
    }

    /// Check that the window advances on every step.
    pub fn validate(&self) -> EmbeddingResult<()> {
        if self.chunk_size == 0 {
            return Err(EmbeddingError::InvalidInput(
                "chunk size must be at least one word".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(EmbeddingError::InvalidInput(format!(
                "overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Word-window text chunker.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting configs that would not advance.
    pub fn new(config: ChunkConfig) -> EmbeddingResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split text into overlapping word chunks.
    ///
    /// Text with at most `chunk_size` words yields a single chunk; empty or
    /// whitespace-only text yields none.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let step = self.config.chunk_size - self.config.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.config.chunk_size).min(words.len());
            chunks.push(Chunk {
                text: words[start..end].join(" "),
                start_word: start,
                end_word: end,
                index: chunks.len(),
            });
            if end == words.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// A chunk of text with its word range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text, words joined by single spaces.
    pub text: String,
    /// First word index (inclusive).
    pub start_word: usize,
    /// Last word index (exclusive).
    pub end_word: usize,
    /// Chunk index.
    pub index: usize,
}

impl Chunk {
    /// Number of words in the chunk.
    pub fn word_count(&self) -> usize {
        self.end_word - self.start_word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_no_chunking() {
        let chunker = Chunker::new(ChunkConfig::new(10, 2)).unwrap();
        let chunks = chunker.chunk("Hello   world");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world");
        assert_eq!(chunks[0].word_count(), 2);
    }

    #[test]
    fn test_long_text_chunking_with_overlap() {
        let chunker = Chunker::new(ChunkConfig::new(4, 1)).unwrap();
        let chunks = chunker.chunk(&words(10));

        // Windows start at 0, 3, 6 and the last one reaches the end.
        let ranges: Vec<(usize, usize)> =
            chunks.iter().map(|c| (c.start_word, c.end_word)).collect();
        assert_eq!(ranges, vec![(0, 4), (3, 7), (6, 10)]);
        assert_eq!(chunks[1].text, "w3 w4 w5 w6");
        assert!(chunks.iter().all(|c| c.word_count() <= 4));
    }

    #[test]
    fn exact_fit_is_one_chunk() {
        let chunker = Chunker::new(ChunkConfig::new(5, 2)).unwrap();
        assert_eq!(chunker.chunk(&words(5)).len(), 1);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(Chunker::default().chunk("  \n\t ").is_empty());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(Chunker::new(ChunkConfig::new(0, 0)).is_err());
        assert!(Chunker::new(ChunkConfig::new(5, 5)).is_err());
        assert!(Chunker::new(ChunkConfig::new(5, 9)).is_err());
    }
}
