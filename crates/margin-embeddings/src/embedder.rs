//! Core embedder trait and types.

use async_trait::async_trait;
use thiserror::Error;

/// Embedding error types.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Transient provider failure (transport error, 5xx, malformed reply).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider asked us to slow down.
    #[error("Rate limited by provider")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Provider refused the request (authentication, bad request). Not retried.
    #[error("Provider rejected request: {0}")]
    Rejected(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

impl EmbeddingError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Provider(_) | EmbeddingError::RateLimited { .. }
        )
    }

    /// Whether the failure came from the embedding provider rather than the caller.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Provider(_)
                | EmbeddingError::RateLimited { .. }
                | EmbeddingError::Rejected(_)
        )
    }
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Core trait for embedding providers.
///
/// Implementors convert text to dense vectors. Retries, batching and
/// validation live in [`crate::EmbeddingService`]; providers only make calls.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text string.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed multiple texts in one provider call, preserving order.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        // Default implementation: embed one by one
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;

    /// Compute cosine similarity between two vectors from this model.
    fn similarity(&self, a: &[f32], b: &[f32]) -> EmbeddingResult<f32> {
        crate::vector::cosine_similarity(a, b)
    }
}
