//! Simple hash-based embedder (no external dependencies).
//!
//! This embedder hashes words into a fixed-dimension space. It is not as
//! semantically rich as a neural model, but it is deterministic and works
//! offline, which makes it the default for development and tests.

use crate::{Embedder, EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "of", "on", "or", "the", "to", "with",
];

/// Simple hash-based embedder.
///
/// Creates embeddings by hashing words into a fixed-dimension space.
/// Uses multiple hash functions for better distribution.
///
/// # Example
///
/// ```rust
/// use margin_embeddings::{Embedder, SimpleEmbedder};
///
/// let embedder = SimpleEmbedder::new(128);
/// let vec = futures::executor::block_on(embedder.embed("hello world")).unwrap();
/// assert_eq!(vec.len(), 128);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleEmbedder {
    dimension: usize,
    num_hashes: usize,
}

impl SimpleEmbedder {
    /// Create a new simple embedder with specified dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            num_hashes: 4, // Multiple hashes for better distribution
        }
    }

    /// Create with default dimension (256).
    pub fn default_dimension() -> Self {
        Self::new(256)
    }

    /// Tokenize text into lowercase content words.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.chars().count() > 1 && !STOPWORDS.contains(s))
            .map(|s| s.to_string())
            .collect()
    }

    /// Hash a word with a seed to get an index.
    fn hash_with_seed(&self, word: &str, seed: u64) -> usize {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        word.hash(&mut hasher);
        (hasher.finish() as usize) % self.dimension
    }

    /// Hash a word with a seed to get a sign (+1 or -1).
    fn sign_hash(&self, word: &str, seed: u64) -> f32 {
        let mut hasher = DefaultHasher::new();
        (seed + 1000).hash(&mut hasher);
        word.hash(&mut hasher);
        if hasher.finish() % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    fn embed_sync(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        // Text made only of stopwords or symbols ("Q&A") hashes as one token.
        let mut tokens = self.tokenize(text);
        if tokens.is_empty() {
            tokens.push(text.trim().to_lowercase());
        }

        let mut vector = vec![0.0f32; self.dimension];

        // Use multiple hash functions for each token
        for token in &tokens {
            for seed in 0..self.num_hashes as u64 {
                let idx = self.hash_with_seed(token, seed);
                let sign = self.sign_hash(token, seed);
                vector[idx] += sign;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            // Every hash cancelled out; fall back to a single deterministic bucket.
            vector[self.hash_with_seed(&tokens[0], 0)] = 1.0;
            return Ok(vector);
        }
        for v in &mut vector {
            *v /= norm;
        }

        Ok(vector)
    }
}

impl Default for SimpleEmbedder {
    fn default() -> Self {
        Self::default_dimension()
    }
}

#[async_trait]
impl Embedder for SimpleEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_sync(text)
    }

    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_sync(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "simple-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_embedder() {
        let embedder = SimpleEmbedder::new(128);

        let v1 = embedder.embed("hello world").await.unwrap();
        let v2 = embedder.embed("hello world").await.unwrap();
        let v3 = embedder.embed("goodbye universe").await.unwrap();

        assert_eq!(v1.len(), 128);

        // Same text should produce same embedding
        let sim_same = embedder.similarity(&v1, &v2).unwrap();
        assert!((sim_same - 1.0).abs() < 0.001);

        // Different text should produce different embedding
        let sim_diff = embedder.similarity(&v1, &v3).unwrap();
        assert!(sim_diff < 0.9);
    }

    #[tokio::test]
    async fn test_similar_texts() {
        let embedder = SimpleEmbedder::new(256);

        let v1 = embedder.embed("habits and identity").await.unwrap();
        let v2 = embedder.embed("identity and habits change").await.unwrap();
        let v3 = embedder.embed("quantum computing algorithms").await.unwrap();

        let sim_related = embedder.similarity(&v1, &v2).unwrap();
        let sim_unrelated = embedder.similarity(&v1, &v3).unwrap();

        // Related texts should have higher similarity
        assert!(sim_related > sim_unrelated);
    }

    #[tokio::test]
    async fn rejects_blank_text() {
        let embedder = SimpleEmbedder::default();
        assert!(matches!(
            embedder.embed("   ").await,
            Err(EmbeddingError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn symbol_only_text_still_embeds() {
        let embedder = SimpleEmbedder::new(64);

        let qa = embedder.embed("Q&A").await.unwrap();
        assert_eq!(qa.len(), 64);
        assert_eq!(qa, embedder.embed("  q&a ").await.unwrap());
        assert_ne!(qa, embedder.embed("a of the").await.unwrap());

        let batch = embedder.embed_batch(&["Q&A", "atomic habits"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], qa);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let embedder = SimpleEmbedder::new(64);
        let batch = embedder
            .embed_batch(&["deep work", "atomic habits"])
            .await
            .unwrap();
        assert_eq!(batch[0], embedder.embed("deep work").await.unwrap());
        assert_eq!(batch[1], embedder.embed("atomic habits").await.unwrap());
    }
}
