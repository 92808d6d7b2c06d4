//! Item repository module.

use crate::errors::ApiError;
use crate::models::Item;
use crate::store::{field_filter, Store};

pub const COLLECTION: &str = "items";

/// True iff any item exists with this name.
pub async fn name_exists(store: &dyn Store, name: &str) -> Result<bool, ApiError> {
    let filter = field_filter("name", name);
    let fetched = store.fetch(COLLECTION, Some(&filter)).await?;
    Ok(fetched.count != 0)
}

/// Get an item by store key.
pub async fn get(store: &dyn Store, key: &str) -> Result<Option<Item>, ApiError> {
    match store.get(COLLECTION, key).await? {
        Some(doc) => Ok(Some(from_doc(doc)?)),
        None => Ok(None),
    }
}

/// All items.
pub async fn list(store: &dyn Store) -> Result<Vec<Item>, ApiError> {
    let fetched = store.fetch(COLLECTION, None).await?;
    fetched.items.into_iter().map(from_doc).collect()
}

/// Create a new item. Returns the stored record with its assigned key.
pub async fn create(store: &dyn Store, name: &str, description: &str) -> Result<Item, ApiError> {
    let item = Item {
        key: None,
        name: name.to_string(),
        description: description.to_string(),
    };

    save(store, item).await
}

/// Persist an item (upsert by key when present).
pub async fn save(store: &dyn Store, item: Item) -> Result<Item, ApiError> {
    let doc = serde_json::to_value(&item)
        .map_err(|e| ApiError::Store(format!("Failed to serialize item: {}", e)))?;
    let stored = store.put(COLLECTION, doc).await?;
    from_doc(stored)
}

/// Delete an item by key.
pub async fn delete(store: &dyn Store, key: &str) -> Result<(), ApiError> {
    store.delete(COLLECTION, key).await?;
    Ok(())
}

fn from_doc(doc: serde_json::Value) -> Result<Item, ApiError> {
    serde_json::from_value(doc)
        .map_err(|e| ApiError::Store(format!("Failed to deserialize item: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_create_list_delete() {
        let store = MemoryStore::new();

        let item = create(&store, "widget", "a widget")
            .await
            .expect("create should succeed");
        let key = item.key.clone().expect("key assigned");

        assert!(name_exists(&store, "widget").await.expect("exists"));
        assert!(!name_exists(&store, "gadget").await.expect("exists"));
        assert_eq!(list(&store).await.expect("list").len(), 1);

        delete(&store, &key).await.expect("delete");
        assert!(get(&store, &key).await.expect("get").is_none());
        assert!(list(&store).await.expect("list").is_empty());
    }
}
