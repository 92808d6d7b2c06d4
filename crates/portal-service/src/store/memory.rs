//! In-process store backend.
//!
//! Collections live in a `RwLock`-guarded map of key-ordered documents.
//! Used by the test harness and local development; the contract matches
//! the Postgres backend.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{assign_key, matches_filter, FetchResponse, Store, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch(
        &self,
        collection: &str,
        filter: Option<&Map<String, Value>>,
    ) -> Result<FetchResponse, StoreError> {
        let collections = self.collections.read().await;
        let items: Vec<Value> = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filter.map_or(true, |f| matches_filter(doc, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let count = items.len();
        Ok(FetchResponse { items, count })
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn put(&self, collection: &str, mut doc: Value) -> Result<Value, StoreError> {
        let key = assign_key(&mut doc)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key, doc.clone());
        Ok(doc)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(key);
        }
        Ok(())
    }
}
