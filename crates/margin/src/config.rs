//! Engine configuration, loadable from TOML.

use crate::{Error, Result};
use margin_embeddings::{Embedder, EmbeddingService, RetryPolicy, SimpleEmbedder};
use margin_graph::GraphConfig;
use margin_rank::RankingConfig;
use margin_vectors::SearchOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Full engine configuration. Every section and field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Which embedder backs the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Offline hash embedder.
    #[default]
    Simple,
    /// Hosted HTTP provider (requires the `api` feature).
    Api,
}

/// Search threshold for the hash embedder, whose scores are word-overlap cosines.
pub const SIMPLE_THRESHOLD: f32 = 0.25;

impl ProviderKind {
    /// Threshold used when `[search] threshold` is not set.
    pub fn default_threshold(self) -> f32 {
        match self {
            ProviderKind::Simple => SIMPLE_THRESHOLD,
            ProviderKind::Api => margin_vectors::index::DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Model name for the `api` provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// OpenAI-compatible endpoint. Unset means OpenAI itself.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the provider key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Minimum score. Unset means the provider's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog file, relative to the config file's directory.
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

fn default_dimension() -> usize { 256 }
fn default_model() -> String { "text-embedding-3-small".to_string() }
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }
fn default_batch_size() -> usize { margin_embeddings::DEFAULT_BATCH_SIZE }
fn default_retry_attempts() -> u32 { 3 }
fn default_retry_base_delay_ms() -> u64 { 200 }
fn default_limit() -> usize { margin_vectors::index::DEFAULT_LIMIT }
fn default_catalog_path() -> PathBuf { PathBuf::from("catalog.json") }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            dimension: default_dimension(),
            model: default_model(),
            endpoint: None,
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            threshold: None,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

impl EmbeddingConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.retry_attempts)
            .with_base_delay(Duration::from_millis(self.retry_base_delay_ms))
    }

    /// Instantiate the configured embedder.
    pub fn build_embedder(&self) -> Result<Arc<dyn Embedder>> {
        if self.dimension == 0 {
            return Err(Error::Config("embedding.dimension must be at least 1".to_string()));
        }
        match self.provider {
            ProviderKind::Simple => Ok(Arc::new(SimpleEmbedder::new(self.dimension))),
            ProviderKind::Api => self.build_api_embedder(),
        }
    }

    #[cfg(feature = "api")]
    fn build_api_embedder(&self) -> Result<Arc<dyn Embedder>> {
        use margin_embeddings::{ApiConfig, ApiEmbedder};

        let key = std::env::var(&self.api_key_env).map_err(|_| {
            Error::Config(format!("environment variable {} is not set", self.api_key_env))
        })?;
        let config = match &self.endpoint {
            Some(endpoint) => ApiConfig::custom(endpoint, &key, &self.model, self.dimension),
            None => ApiConfig::openai(&key)
                .with_model(&self.model)
                .with_dimensions(self.dimension),
        };
        Ok(Arc::new(ApiEmbedder::new(config)?))
    }

    #[cfg(not(feature = "api"))]
    fn build_api_embedder(&self) -> Result<Arc<dyn Embedder>> {
        Err(Error::Config(
            "embedding.provider = \"api\" requires the `api` feature".to_string(),
        ))
    }

    /// Embedder wrapped with the configured retry policy and batch size.
    pub fn build_service(&self) -> Result<EmbeddingService> {
        if self.batch_size == 0 {
            return Err(Error::Config("embedding.batch_size must be at least 1".to_string()));
        }
        Ok(EmbeddingService::new(self.build_embedder()?)
            .with_retry(self.retry_policy())
            .with_batch_size(self.batch_size))
    }
}

impl SearchConfig {
    pub fn threshold_for(&self, provider: ProviderKind) -> f32 {
        self.threshold.unwrap_or_else(|| provider.default_threshold())
    }

    pub fn options(&self, provider: ProviderKind) -> SearchOptions {
        SearchOptions::default()
            .with_limit(self.limit)
            .with_threshold(self.threshold_for(provider))
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Check the sections that are validated eagerly.
    pub fn validate(&self) -> Result<()> {
        self.ranking.validate()?;
        if self.search.limit == 0 {
            return Err(Error::Config("search.limit must be at least 1".to_string()));
        }
        if let Some(threshold) = self.search.threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(Error::Config(format!(
                    "search.threshold must be within [-1, 1], got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.embedding.dimension, 256);
        assert_eq!(config.search.threshold, None);
        assert_eq!(config.search.options(ProviderKind::Simple).threshold, SIMPLE_THRESHOLD);
        assert_eq!(config.search.options(ProviderKind::Api).threshold, 0.5);
        assert_eq!(config.graph.ttl_secs, 300);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [embedding]
            dimension = 64
            retry_attempts = 5

            [graph]
            ttl_secs = 60

            [ranking.weights]
            similarity = 0.4
            recency = 0.2
            popularity = 0.2
            topic = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.embedding.dimension, 64);
        assert_eq!(config.embedding.batch_size, 100);
        assert_eq!(config.embedding.retry_policy().max_attempts, 5);
        assert_eq!(config.graph.ttl_secs, 60);
        assert_eq!(config.graph.max_path_depth, 5);
        assert_eq!(config.ranking.weights.similarity, 0.4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_threshold_wins_over_provider_default() {
        let config = EngineConfig::from_toml_str("[search]\nthreshold = 0.7").unwrap();
        assert_eq!(config.search.options(ProviderKind::Simple).threshold, 0.7);
        assert_eq!(config.search.options(ProviderKind::Api).threshold, 0.7);
        assert!(!EngineConfig::default().to_toml_string().unwrap().contains("threshold"));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = EngineConfig::default();
        config.search.limit = 3;
        config.catalog.path = PathBuf::from("data/catalog.json");

        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(matches!(
            EngineConfig::from_toml_str("[embedding]\nprovider = \"quantum\""),
            Err(Error::Config(_))
        ));

        let mut config = EngineConfig::default();
        config.embedding.dimension = 0;
        assert!(matches!(config.embedding.build_service(), Err(Error::Config(_))));

        let mut config = EngineConfig::default();
        config.search.threshold = Some(1.5);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = EngineConfig::default();
        config.ranking.weights.similarity = 0.9;
        assert!(matches!(config.validate(), Err(Error::Rank(_))));
    }

    #[cfg(not(feature = "api"))]
    #[test]
    fn api_provider_needs_the_feature() {
        let mut config = EngineConfig::default();
        config.embedding.provider = ProviderKind::Api;
        assert!(matches!(config.embedding.build_embedder(), Err(Error::Config(_))));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("margin.toml");
        let mut config = EngineConfig::default();
        config.embedding.dimension = 32;

        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }
}
