use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_true() -> bool {
    true
}

/// User record (collection `users`).
///
/// The stored document keeps the password hash; responses use [`UserRead`],
/// which carries neither the hash nor the role flags.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub username: String,
    #[serde(default)]
    pub fullname: Option<String>,
    pub hashed_password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_verified: bool,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("key", &self.key)
            .field("username", &self.username)
            .field("fullname", &self.fullname)
            .field("hashed_password", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("is_superuser", &self.is_superuser)
            .field("is_verified", &self.is_verified)
            .finish()
    }
}

/// Signup / admin-create request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub fullname: Option<String>,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRead {
    pub key: String,
    pub username: String,
    #[serde(default)]
    pub fullname: Option<String>,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        UserRead {
            key: user.key.unwrap_or_default(),
            username: user.username,
            fullname: user.fullname,
        }
    }
}

/// Admin merge-patch payload: only present fields are overwritten.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
}

/// Self-service merge-patch payload for `PATCH /user/patch/me`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelfUpdate {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Item record (collection `items`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemCreate {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRead {
    pub key: String,
    pub name: String,
    pub description: String,
}

impl From<Item> for ItemRead {
    fn from(item: Item) -> Self {
        ItemRead {
            key: item.key.unwrap_or_default(),
            name: item.name,
            description: item.description,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One-time email verification record (collection `verifications`).
///
/// The store-assigned key doubles as the opaque code mailed to the user.
/// Consumed (deleted) exactly once at successful verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub user_key: String,
    pub expires_at: DateTime<Utc>,
}

/// Bearer token response for `POST /auth/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Plain detail message, e.g. for the verification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}
