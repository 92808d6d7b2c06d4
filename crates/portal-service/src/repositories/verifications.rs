//! Verification record repository module.
//!
//! A verification record links a store-assigned opaque code to an
//! unverified user. It is created at signup (or admin user creation) and
//! deleted exactly once at successful verification.

use chrono::{DateTime, Utc};

use crate::errors::ApiError;
use crate::models::Verification;
use crate::store::Store;

pub const COLLECTION: &str = "verifications";

/// Create a verification record for a user. The store assigns the opaque
/// code used in the emailed link.
pub async fn create(
    store: &dyn Store,
    user_key: &str,
    expires_at: DateTime<Utc>,
) -> Result<Verification, ApiError> {
    let verification = Verification {
        key: None,
        user_key: user_key.to_string(),
        expires_at,
    };

    let doc = serde_json::to_value(&verification)
        .map_err(|e| ApiError::Store(format!("Failed to serialize verification: {}", e)))?;
    let stored = store.put(COLLECTION, doc).await?;
    from_doc(stored)
}

/// Get a verification record by its code.
pub async fn get(store: &dyn Store, key: &str) -> Result<Option<Verification>, ApiError> {
    match store.get(COLLECTION, key).await? {
        Some(doc) => Ok(Some(from_doc(doc)?)),
        None => Ok(None),
    }
}

/// Delete a verification record (consume the code).
pub async fn delete(store: &dyn Store, key: &str) -> Result<(), ApiError> {
    store.delete(COLLECTION, key).await?;
    Ok(())
}

fn from_doc(doc: serde_json::Value) -> Result<Verification, ApiError> {
    serde_json::from_value(doc)
        .map_err(|e| ApiError::Store(format!("Failed to deserialize verification: {}", e)))
}
