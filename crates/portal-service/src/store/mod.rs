//! Key-value document store contract and backends.
//!
//! The service treats its database as an opaque store of JSON documents
//! grouped into named collections (`users`, `verifications`, `items`).
//! Every document is an object carrying its store-assigned key under the
//! `"key"` field. Two backends implement the contract: [`memory::MemoryStore`]
//! for tests and local development, and [`postgres::PostgresStore`] for
//! production.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("record is not a JSON object")]
    InvalidRecord,
}

/// Result of a [`Store::fetch`] call.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub items: Vec<Value>,
    pub count: usize,
}

/// Store contract, per named collection:
///
/// - `fetch`: all documents, or those whose top-level fields exactly match
///   the filter.
/// - `get`: lookup by key.
/// - `put`: upsert when the document carries a key, insert with a generated
///   key otherwise; returns the stored document.
/// - `delete`: idempotent — deleting an absent key is not an error.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch(
        &self,
        collection: &str,
        filter: Option<&Map<String, Value>>,
    ) -> Result<FetchResponse, StoreError>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    async fn put(&self, collection: &str, doc: Value) -> Result<Value, StoreError>;

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;
}

/// Exact-match filter on a single string field.
pub fn field_filter(field: &str, value: &str) -> Map<String, Value> {
    let mut filter = Map::new();
    filter.insert(field.to_string(), Value::String(value.to_string()));
    filter
}

/// Return the document's key, assigning a fresh one when absent.
///
/// The document must be a JSON object. A `"key"` that is missing, null, or
/// empty is replaced with a generated opaque id.
fn assign_key(doc: &mut Value) -> Result<String, StoreError> {
    let obj = doc.as_object_mut().ok_or(StoreError::InvalidRecord)?;

    match obj.get("key") {
        Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
        _ => {
            let key = Uuid::new_v4().simple().to_string();
            obj.insert("key".to_string(), Value::String(key.clone()));
            Ok(key)
        }
    }
}

/// True iff every filter field is present in `doc` with an equal value.
fn matches_filter(doc: &Value, filter: &Map<String, Value>) -> bool {
    filter
        .iter()
        .all(|(field, expected)| doc.get(field) == Some(expected))
}
