use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::envelope::RecordEnvelope;
use crate::error::StoreResult;
use crate::filter::{Filter, IndexSpec, Sort};
use crate::traits::{DocumentStore, ProjectionSession};

/// In-memory, HashMap-based document store.
///
/// Intended for tests and embedding. Collections are held behind a
/// `RwLock`; sessions stage records privately and append them under a
/// single write lock at commit, so committed batches appear atomically.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<RecordEnvelope>>,
    info: HashMap<String, Vec<u8>>,
    indexes: HashMap<String, Vec<IndexSpec>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes declared for a collection.
    pub fn indexes(&self, collection: &str) -> Vec<IndexSpec> {
        self.inner
            .read()
            .expect("store lock poisoned")
            .indexes
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn matching(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Vec<RecordEnvelope> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut records: Vec<RecordEnvelope> = inner
            .collections
            .get(collection)
            .map(|records| records.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(sort) = sort {
            records.sort_by(|a, b| sort.compare(a, b));
        }
        records
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
        limit: Option<u64>,
        visit: &mut (dyn FnMut(RecordEnvelope) -> bool + Send),
    ) -> StoreResult<()> {
        let records = self.matching(collection, filter, sort);
        let limit = limit.unwrap_or(u64::MAX);
        for record in records.into_iter().take(limit as usize) {
            if !visit(record) {
                break;
            }
        }
        Ok(())
    }

    async fn get_one(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> StoreResult<Option<RecordEnvelope>> {
        Ok(self.matching(collection, filter, sort).into_iter().next())
    }

    async fn bulk_delete(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let Some(records) = inner.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|r| !filter.matches(r));
        Ok((before - records.len()) as u64)
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let indexes = inner.indexes.entry(collection.to_owned()).or_default();
        if !indexes.iter().any(|existing| existing.name == index.name) {
            indexes.push(index.clone());
        }
        Ok(())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner
            .collections
            .get(collection)
            .map(|records| records.iter().filter(|r| filter.matches(r)).count() as u64)
            .unwrap_or(0))
    }

    async fn get_info(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.info.get(key).cloned())
    }

    async fn set_info(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.info.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn session(&self) -> StoreResult<Box<dyn ProjectionSession>> {
        Ok(Box::new(MemorySession {
            staged: Vec::new(),
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MemorySession {
    staged: Vec<(String, RecordEnvelope)>,
    inner: Arc<RwLock<Inner>>,
}

#[async_trait]
impl ProjectionSession for MemorySession {
    fn stage(&mut self, collection: &str, record: RecordEnvelope) {
        self.staged.push((collection.to_owned(), record));
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        for (collection, record) in self.staged {
            inner.collections.entry(collection).or_default().push(record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(height: u64, key: &str) -> RecordEnvelope {
        RecordEnvelope::rich("test", &json!({"height": height, "key": key})).unwrap()
    }

    async fn seeded() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        let mut session = store.session().await.unwrap();
        session.stage("states", record(2, "b"));
        session.stage("states", record(5, "a"));
        session.stage("states", record(9, "c"));
        session.commit().await.unwrap();
        store
    }

    #[tokio::test]
    async fn session_commit_is_atomic() {
        let store = InMemoryDocumentStore::new();
        let mut session = store.session().await.unwrap();
        session.stage("states", record(1, "a"));

        // Nothing visible before commit.
        assert_eq!(store.count("states", &Filter::new()).await.unwrap(), 0);

        session.commit().await.unwrap();
        assert_eq!(store.count("states", &Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dropped_session_writes_nothing() {
        let store = InMemoryDocumentStore::new();
        {
            let mut session = store.session().await.unwrap();
            session.stage("states", record(1, "a"));
        }
        assert_eq!(store.count("states", &Filter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn get_one_respects_filter_and_sort() {
        let store = seeded().await;

        let none = store
            .get_one("states", &Filter::new().eq("height", 7), None)
            .await
            .unwrap();
        assert!(none.is_none());

        let first = store
            .get_one("states", &Filter::new(), Some(&Sort::descending("height")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.payload["height"], json!(9));
    }

    #[tokio::test]
    async fn find_many_honors_limit_and_visitor_stop() {
        let store = seeded().await;
        let sort = Sort::ascending("height");

        let mut seen = Vec::new();
        store
            .find_many("states", &Filter::new(), Some(&sort), Some(2), &mut |r| {
                seen.push(r.payload["height"].as_u64().unwrap());
                true
            })
            .await
            .unwrap();
        assert_eq!(seen, vec![2, 5]);

        let mut seen = Vec::new();
        store
            .find_many("states", &Filter::new(), Some(&sort), None, &mut |r| {
                seen.push(r.payload["height"].as_u64().unwrap());
                false
            })
            .await
            .unwrap();
        assert_eq!(seen, vec![2]);
    }

    #[tokio::test]
    async fn bulk_delete_removes_matches_only() {
        let store = seeded().await;
        let removed = store
            .bulk_delete("states", &Filter::new().gte("height", 5))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("states", &Filter::new()).await.unwrap(), 1);

        let removed = store
            .bulk_delete("missing", &Filter::new())
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn info_roundtrip() {
        let store = InMemoryDocumentStore::new();
        assert!(store.get_info("marker").await.unwrap().is_none());

        store.set_info("marker", &[1, 2, 3]).await.unwrap();
        assert_eq!(store.get_info("marker").await.unwrap(), Some(vec![1, 2, 3]));

        store.set_info("marker", &[9]).await.unwrap();
        assert_eq!(store.get_info("marker").await.unwrap(), Some(vec![9]));
    }

    #[tokio::test]
    async fn create_index_is_idempotent_by_name() {
        let store = InMemoryDocumentStore::new();
        let index = IndexSpec::new("by-height", &["height"]).unique();
        store.create_index("states", &index).await.unwrap();
        store.create_index("states", &index).await.unwrap();
        assert_eq!(store.indexes("states"), vec![index]);
    }
}
