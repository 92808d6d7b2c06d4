//! User repository module.
//!
//! Provides store access for user management: lookup by key and username,
//! creation, persistence, and deletion.

use crate::errors::ApiError;
use crate::models::User;
use crate::store::{field_filter, Store};

pub const COLLECTION: &str = "users";

/// Get the user with this username, when exactly one exists.
///
/// Zero matches and multiple matches (possible through the documented
/// signup race) both return `None`: an ambiguous identity is treated as
/// missing, never defaulted.
pub async fn get_by_username(store: &dyn Store, username: &str) -> Result<Option<User>, ApiError> {
    let filter = field_filter("username", username);
    let fetched = store.fetch(COLLECTION, Some(&filter)).await?;

    if fetched.count != 1 {
        return Ok(None);
    }

    let doc = fetched
        .items
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Store("fetch count disagrees with items".to_string()))?;

    Ok(Some(from_doc(doc)?))
}

/// True iff any user exists with this username.
pub async fn username_exists(store: &dyn Store, username: &str) -> Result<bool, ApiError> {
    let filter = field_filter("username", username);
    let fetched = store.fetch(COLLECTION, Some(&filter)).await?;
    Ok(fetched.count != 0)
}

/// Get a user by store key.
pub async fn get(store: &dyn Store, key: &str) -> Result<Option<User>, ApiError> {
    match store.get(COLLECTION, key).await? {
        Some(doc) => Ok(Some(from_doc(doc)?)),
        None => Ok(None),
    }
}

/// All users.
pub async fn list(store: &dyn Store) -> Result<Vec<User>, ApiError> {
    let fetched = store.fetch(COLLECTION, None).await?;
    fetched.items.into_iter().map(from_doc).collect()
}

/// Create a new user with default flags (active, not superuser, not
/// verified). Returns the stored record with its assigned key.
pub async fn create(
    store: &dyn Store,
    username: &str,
    fullname: Option<&str>,
    hashed_password: &str,
) -> Result<User, ApiError> {
    let user = User {
        key: None,
        username: username.to_string(),
        fullname: fullname.map(|name| name.to_string()),
        hashed_password: hashed_password.to_string(),
        is_active: true,
        is_superuser: false,
        is_verified: false,
    };

    save(store, user).await
}

/// Persist a user (upsert by key when present).
pub async fn save(store: &dyn Store, user: User) -> Result<User, ApiError> {
    let doc = serde_json::to_value(&user)
        .map_err(|e| ApiError::Store(format!("Failed to serialize user: {}", e)))?;
    let stored = store.put(COLLECTION, doc).await?;
    from_doc(stored)
}

/// Delete a user by key.
pub async fn delete(store: &dyn Store, key: &str) -> Result<(), ApiError> {
    store.delete(COLLECTION, key).await?;
    Ok(())
}

fn from_doc(doc: serde_json::Value) -> Result<User, ApiError> {
    serde_json::from_value(doc)
        .map_err(|e| ApiError::Store(format!("Failed to deserialize user: {}", e)))
}
