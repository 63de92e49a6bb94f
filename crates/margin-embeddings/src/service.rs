//! The embedding service: one place where every provider call is retried,
//! batched and validated before a vector reaches the rest of the engine.

use crate::chunker::{ChunkConfig, Chunker};
use crate::retry::RetryPolicy;
use crate::vector::average;
use crate::{Embedder, EmbeddingError, EmbeddingResult};
use futures::future::join_all;
use std::sync::Arc;

/// Default number of texts sent per provider request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Wraps an [`Embedder`] with retry, batching and output validation.
#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("model", &self.embedder.model_name())
            .field("dimension", &self.embedder.dimension())
            .field("retry", &self.retry)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the provider batch size. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        let vector = self.retry.run(|| self.embedder.embed(text)).await?;
        self.check_vector(&vector)?;
        Ok(vector)
    }

    /// Embed many texts, preserving input order.
    ///
    /// Batches run concurrently, each with its own retry budget. Every batch
    /// is awaited before the first failure (in input order) is returned.
    pub async fn embed_batch<S>(&self, texts: &[S]) -> EmbeddingResult<Vec<Vec<f32>>>
    where
        S: AsRef<str> + Sync,
    {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(pos) = texts.iter().position(|t| t.as_ref().trim().is_empty()) {
            return Err(EmbeddingError::InvalidInput(format!(
                "text at position {} is empty",
                pos
            )));
        }

        let batches: Vec<Vec<&str>> = texts
            .chunks(self.batch_size)
            .map(|chunk| chunk.iter().map(|t| t.as_ref()).collect())
            .collect();

        tracing::debug!(
            texts = texts.len(),
            batches = batches.len(),
            model = self.model_name(),
            "embedding batch"
        );

        let results = join_all(batches.iter().map(|batch| self.embed_one_batch(batch))).await;

        let mut vectors = Vec::with_capacity(texts.len());
        for result in results {
            vectors.extend(result?);
        }
        Ok(vectors)
    }

    async fn embed_one_batch(&self, batch: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let vectors = self.retry.run(|| self.embedder.embed_batch(batch)).await?;
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::Provider(format!(
                "provider returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        for vector in &vectors {
            self.check_vector(vector)?;
        }
        Ok(vectors)
    }

    /// Embed text of any length by averaging overlapping word chunks.
    ///
    /// Text that fits in one chunk is embedded directly.
    pub async fn embed_long_text(
        &self,
        text: &str,
        chunk_size: usize,
        overlap: usize,
    ) -> EmbeddingResult<Vec<f32>> {
        let chunker = Chunker::new(ChunkConfig::new(chunk_size, overlap))?;
        let chunks = chunker.chunk(text);
        match chunks.len() {
            0 => Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            )),
            1 => self.embed(&chunks[0].text).await,
            _ => {
                let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
                let vectors = self.embed_batch(&texts).await?;
                average(&vectors)
            }
        }
    }

    /// Reject vectors the provider should never have produced.
    pub fn check_vector(&self, vector: &[f32]) -> EmbeddingResult<()> {
        if vector.is_empty() {
            return Err(EmbeddingError::Provider(
                "provider returned an empty vector".to_string(),
            ));
        }
        if vector.len() != self.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension(),
                got: vector.len(),
            });
        }
        if vector.iter().all(|x| *x == 0.0) {
            return Err(EmbeddingError::Provider(
                "provider returned a zero vector".to_string(),
            ));
        }
        Ok(())
    }
}
