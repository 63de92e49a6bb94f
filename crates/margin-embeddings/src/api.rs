//! Hosted embedding providers (OpenAI, Voyage, Cohere, OpenAI-compatible).
//!
//! Requires the `api` feature. Each call is a single HTTP request; retries
//! and batch splitting are handled by [`crate::EmbeddingService`].

use crate::{Embedder, EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// API provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiProvider {
    OpenAI,
    Voyage,
    Cohere,
    /// Any endpoint speaking the OpenAI embeddings wire format.
    Custom,
}

impl ApiProvider {
    fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            ApiProvider::OpenAI => Some("https://api.openai.com/v1/embeddings"),
            ApiProvider::Voyage => Some("https://api.voyageai.com/v1/embeddings"),
            ApiProvider::Cohere => Some("https://api.cohere.ai/v1/embed"),
            ApiProvider::Custom => None,
        }
    }
}

/// Configuration for API-based embeddings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub provider: ApiProvider,
    pub api_key: String,
    pub model: String,
    /// Overrides the provider's default endpoint. Required for `Custom`.
    pub endpoint: Option<String>,
    /// Output dimension the model produces.
    pub dimensions: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ApiConfig {
    fn preset(provider: ApiProvider, api_key: &str, model: &str, dimensions: usize) -> Self {
        Self {
            provider,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: None,
            dimensions,
            timeout_secs: 30,
        }
    }

    /// OpenAI `text-embedding-3-small` (1536 dimensions).
    pub fn openai(api_key: &str) -> Self {
        Self::preset(ApiProvider::OpenAI, api_key, "text-embedding-3-small", 1536)
    }

    /// Voyage `voyage-large-2` (1024 dimensions).
    pub fn voyage(api_key: &str) -> Self {
        Self::preset(ApiProvider::Voyage, api_key, "voyage-large-2", 1024)
    }

    /// Cohere `embed-english-v3.0` (1024 dimensions).
    pub fn cohere(api_key: &str) -> Self {
        Self::preset(ApiProvider::Cohere, api_key, "embed-english-v3.0", 1024)
    }

    pub fn custom(endpoint: &str, api_key: &str, model: &str, dimensions: usize) -> Self {
        let mut config = Self::preset(ApiProvider::Custom, api_key, model, dimensions);
        config.endpoint = Some(endpoint.to_string());
        config
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Resolved endpoint URL.
    pub fn endpoint(&self) -> EmbeddingResult<&str> {
        self.endpoint
            .as_deref()
            .or_else(|| self.provider.default_endpoint())
            .ok_or_else(|| {
                EmbeddingError::InvalidInput("custom provider requires an endpoint".to_string())
            })
    }
}

#[derive(Debug, Deserialize)]
struct DataResponse {
    data: Vec<DataEmbedding>,
}

#[derive(Debug, Deserialize)]
struct DataEmbedding {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct CohereResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by a hosted HTTP API.
///
/// ```rust,ignore
/// use margin_embeddings::{ApiConfig, ApiEmbedder, EmbeddingService};
/// use std::sync::Arc;
///
/// let embedder = ApiEmbedder::new(ApiConfig::openai(&key))?;
/// let service = EmbeddingService::new(Arc::new(embedder));
/// let vector = service.embed("habit formation").await?;
/// ```
pub struct ApiEmbedder {
    config: ApiConfig,
    client: reqwest::Client,
}

impl ApiEmbedder {
    pub fn new(config: ApiConfig) -> EmbeddingResult<Self> {
        config.endpoint()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request_body(&self, texts: &[&str]) -> serde_json::Value {
        match self.config.provider {
            ApiProvider::OpenAI | ApiProvider::Custom => json!({
                "model": self.config.model,
                "input": texts,
                "dimensions": self.config.dimensions,
            }),
            ApiProvider::Voyage => json!({
                "model": self.config.model,
                "input": texts,
            }),
            ApiProvider::Cohere => json!({
                "model": self.config.model,
                "texts": texts,
                "input_type": "search_document",
            }),
        }
    }

    fn parse_body(&self, body: &str) -> EmbeddingResult<Vec<Vec<f32>>> {
        let parsed = match self.config.provider {
            ApiProvider::Cohere => {
                serde_json::from_str::<CohereResponse>(body).map(|r| r.embeddings)
            }
            _ => serde_json::from_str::<DataResponse>(body)
                .map(|r| r.data.into_iter().map(|e| e.embedding).collect()),
        };
        parsed.map_err(|e| EmbeddingError::Provider(format!("malformed response: {}", e)))
    }
}

/// Map a non-success HTTP status onto the embedding error taxonomy.
pub(crate) fn status_error(
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
) -> EmbeddingError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        EmbeddingError::RateLimited { retry_after_secs }
    } else if status.is_server_error() {
        EmbeddingError::Provider(format!("{}: {}", status, body))
    } else {
        EmbeddingError::Rejected(format!("{}: {}", status, body))
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Provider("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            provider = ?self.config.provider,
            model = %self.config.model,
            count = texts.len(),
            "embedding request"
        );

        let response = self
            .client
            .post(self.config.endpoint()?)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(texts))
            .send()
            .await
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status, retry_after, &body));
        }

        let vectors = self.parse_body(&body)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Provider(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
