//! Datastore seam: where canonical entities come from.
//!
//! The engine only ever reads. Implementations load a full [`Catalog`]
//! snapshot; the graph and ranking layers decide how often to call them.

use crate::catalog::Catalog;
use crate::error::{CatalogError, CatalogResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Read-only access to the relational datastore holding canonical entities.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Name of this source, for logging.
    fn name(&self) -> &str;

    /// Load a snapshot of all entities and join tables.
    async fn load_catalog(&self) -> CatalogResult<Catalog>;
}

/// Catalog held in memory.
///
/// Contents can be swapped at runtime and the source can be marked
/// unavailable, which makes it useful for exercising rebuild paths.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    catalog: RwLock<Catalog>,
    unavailable: RwLock<Option<String>>,
}

impl InMemoryCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            unavailable: RwLock::new(None),
        }
    }

    /// Replace the catalog contents.
    pub fn replace(&self, catalog: Catalog) {
        if let Ok(mut guard) = self.catalog.write() {
            *guard = catalog;
        }
    }

    /// Make subsequent loads fail with [`CatalogError::Unavailable`].
    pub fn set_unavailable(&self, reason: Option<&str>) {
        if let Ok(mut guard) = self.unavailable.write() {
            *guard = reason.map(str::to_string);
        }
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn load_catalog(&self) -> CatalogResult<Catalog> {
        let unavailable = self
            .unavailable
            .read()
            .map_err(|e| CatalogError::Unavailable(format!("Failed to acquire read lock: {}", e)))?
            .clone();
        if let Some(reason) = unavailable {
            return Err(CatalogError::Unavailable(reason));
        }

        let catalog = self
            .catalog
            .read()
            .map_err(|e| CatalogError::Unavailable(format!("Failed to acquire read lock: {}", e)))?;
        Ok(catalog.clone())
    }
}

/// Catalog exported to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for JsonCatalog {
    fn name(&self) -> &str {
        "json"
    }

    async fn load_catalog(&self) -> CatalogResult<Catalog> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let catalog = Catalog::from_json(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            entities = catalog.entity_count(),
            "loaded catalog"
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Episode;
    use std::io::Write;

    fn one_episode() -> Catalog {
        Catalog {
            episodes: vec![Episode {
                id: "e1".into(),
                title: "Pilot".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn in_memory_replace_and_outage() {
        let source = InMemoryCatalog::new(Catalog::new());
        assert!(source.load_catalog().await.unwrap().is_empty());

        source.replace(one_episode());
        assert_eq!(source.load_catalog().await.unwrap().episodes.len(), 1);

        source.set_unavailable(Some("maintenance"));
        let err = source.load_catalog().await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(ref r) if r == "maintenance"));

        source.set_unavailable(None);
        assert!(source.load_catalog().await.is_ok());
    }

    #[tokio::test]
    async fn json_catalog_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&one_episode()).unwrap()).unwrap();

        let source = JsonCatalog::new(file.path());
        let catalog = source.load_catalog().await.unwrap();
        assert_eq!(catalog.episodes[0].title, "Pilot");
    }

    #[tokio::test]
    async fn json_catalog_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = JsonCatalog::new(file.path()).load_catalog().await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn json_catalog_missing_file_is_io_error() {
        let err = JsonCatalog::new("/definitely/not/here.json")
            .load_catalog()
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
