//! In-memory vector store implementation.
//!
//! Brute-force cosine scoring over an insertion-ordered map. Readers run
//! concurrently; writers are exclusive.

use crate::{ItemKey, ScoredRecord, SearchFilter, VectorError, VectorRecord, VectorResult, VectorStore};
use async_trait::async_trait;
use indexmap::IndexMap;
use margin_embeddings::cosine_similarity;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
struct Inner {
    records: IndexMap<ItemKey, VectorRecord>,
    dimension: Option<usize>,
    /// Set by `with_dimension`; survives `clear`.
    fixed: bool,
}

/// In-memory vector store using brute-force search.
///
/// The dimension is fixed by the constructor or by the first insert; later
/// records and queries of another length are rejected. `clear` forgets a
/// dimension learned from inserts.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

fn poisoned<T>(e: PoisonError<T>) -> VectorError {
    VectorError::Lock(e.to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that only accepts vectors of `dimension` components.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: IndexMap::new(),
                dimension: Some(dimension),
                fixed: true,
            }),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.read().ok().and_then(|inner| inner.dimension)
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> VectorResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        let expected = inner
            .dimension
            .or_else(|| records.first().map(|r| r.dimension()));
        if let Some(expected) = expected {
            if let Some(bad) = records.iter().find(|r| r.dimension() != expected) {
                return Err(VectorError::DimensionMismatch {
                    expected,
                    actual: bad.dimension(),
                });
            }
            inner.dimension = Some(expected);
        }

        for record in records {
            // Replacing an existing key keeps its position.
            inner.records.insert(record.key.clone(), record);
        }
        Ok(())
    }

    async fn get(&self, key: &ItemKey) -> VectorResult<Option<VectorRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.get(key).cloned())
    }

    async fn delete(&self, key: &ItemKey) -> VectorResult<bool> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.records.shift_remove(key).is_some())
    }

    async fn clear(&self) -> VectorResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.records.clear();
        if !inner.fixed {
            inner.dimension = None;
        }
        Ok(())
    }

    async fn count(&self) -> VectorResult<usize> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.len())
    }

    async fn search(
        &self,
        vector: &[f32],
        filter: &SearchFilter,
    ) -> VectorResult<Vec<ScoredRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;

        if let Some(expected) = inner.dimension {
            if vector.len() != expected {
                return Err(VectorError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let mut scored = Vec::new();
        for record in inner.records.values() {
            if !filter.admits(&record.key) {
                continue;
            }
            let score = cosine_similarity(vector, &record.vector)?;
            // NaN never passes the threshold.
            if score >= filter.threshold {
                scored.push((record, score));
            }
        }

        // Stable: ties keep insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(filter.limit)
            .map(|(record, score)| ScoredRecord {
                record: record.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use margin_core::EntityKind;

    fn record(kind: EntityKind, id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord::new(ItemKey::new(kind, id), id, vector)
    }

    fn ep(id: &str, vector: Vec<f32>) -> VectorRecord {
        record(EntityKind::Episode, id, vector)
    }

    #[tokio::test]
    async fn test_upsert_and_search() {
        let store = InMemoryStore::new();

        store
            .upsert(vec![
                ep("a", vec![1.0, 0.0, 0.0]),
                ep("b", vec![0.0, 1.0, 0.0]),
                ep("c", vec![0.7, 0.7, 0.0]),
            ])
            .await
            .unwrap();
        assert_eq!(store.dimension(), Some(3));

        let results = store
            .search(&[1.0, 0.0, 0.0], &SearchFilter::new(2, -1.0))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.key.id, "a");
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1].record.key.id, "c");
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let store = InMemoryStore::new();
        let key = ItemKey::new(EntityKind::Book, "x");

        store.upsert(vec![record(EntityKind::Book, "x", vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap().key, key);

        assert!(store.delete(&key).await.unwrap());
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(!store.delete(&key).await.unwrap());
    }

    #[tokio::test]
    async fn search_filters_kinds_and_threshold() {
        let store = InMemoryStore::new();
        store
            .upsert(vec![
                record(EntityKind::Episode, "e1", vec![1.0, 0.0]),
                record(EntityKind::Book, "b1", vec![1.0, 0.0]),
                record(EntityKind::Episode, "e2", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let filter = SearchFilter::new(10, 0.5).with_kinds(vec![EntityKind::Episode]);
        let results = store.search(&[1.0, 0.0], &filter).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.record.key.id.as_str()).collect();
        assert_eq!(ids, vec!["e1"]);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryStore::new();
        store
            .upsert(vec![
                ep("first", vec![1.0, 0.0]),
                ep("weaker", vec![1.0, 1.0]),
                ep("second", vec![1.0, 0.0]),
                ep("third", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], &SearchFilter::new(10, 0.0)).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.record.key.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third", "weaker"]);
    }

    #[tokio::test]
    async fn reupsert_replaces_in_place() {
        let store = InMemoryStore::new();
        store
            .upsert(vec![ep("a", vec![1.0, 0.0]), ep("b", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert(vec![VectorRecord::new(
                ItemKey::new(EntityKind::Episode, "a"),
                "updated",
                vec![1.0, 0.0],
            )])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let results = store.search(&[1.0, 0.0], &SearchFilter::new(10, 0.0)).await.unwrap();
        assert_eq!(results[0].record.key.id, "a");
        assert_eq!(results[0].record.content, "updated");
    }

    #[tokio::test]
    async fn test_count_and_clear() {
        let store = InMemoryStore::new();
        store
            .upsert(vec![ep("a", vec![1.0, 0.0]), ep("b", vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_accepts_a_new_model_size() {
        let store = InMemoryStore::new();
        store.upsert(vec![ep("a", vec![1.0, 0.0])]).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.dimension(), None);

        store.upsert(vec![ep("a", vec![1.0, 0.0, 0.0])]).await.unwrap();
        assert_eq!(store.dimension(), Some(3));

        let fixed = InMemoryStore::with_dimension(2);
        fixed.clear().await.unwrap();
        assert_eq!(fixed.dimension(), Some(2));
        assert!(fixed.upsert(vec![ep("b", vec![1.0, 0.0, 0.0])]).await.is_err());
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let store = InMemoryStore::with_dimension(3);

        let result = store.upsert(vec![ep("a", vec![1.0, 0.0])]).await;
        assert!(matches!(
            result,
            Err(VectorError::DimensionMismatch { expected: 3, actual: 2 })
        ));

        let result = store.search(&[1.0], &SearchFilter::new(1, 0.0)).await;
        assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
    }

    #[tokio::test]
    async fn mixed_batch_is_rejected_whole() {
        let store = InMemoryStore::new();
        let result = store
            .upsert(vec![ep("a", vec![1.0, 0.0]), ep("b", vec![1.0, 0.0, 0.0])])
            .await;
        assert!(result.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.dimension(), None);
    }
}
