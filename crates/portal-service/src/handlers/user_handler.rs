use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::auth_handler::AppState;
use crate::errors::ApiError;
use crate::extract::{ActiveUser, Superuser};
use crate::models::{SelfUpdate, UserCreate, UserRead, UserUpdate};
use crate::repositories::users;
use crate::security;
use crate::services::account_service;

/// Create a new user (admin path)
///
/// POST /api/v1/user
pub async fn create_one(
    State(state): State<Arc<AppState>>,
    Superuser(_admin): Superuser,
    Json(payload): Json<UserCreate>,
) -> Result<Json<UserRead>, ApiError> {
    let user = account_service::admin_create_user(
        state.store.as_ref(),
        &state.mailer,
        &state.config,
        payload,
    )
    .await?;

    Ok(Json(user))
}

/// List all users
///
/// GET /api/v1/user
pub async fn read_all(
    State(state): State<Arc<AppState>>,
    Superuser(_admin): Superuser,
) -> Result<Json<Vec<UserRead>>, ApiError> {
    let users = users::list(state.store.as_ref()).await?;
    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}

/// Get the calling user
///
/// GET /api/v1/user/me
pub async fn read_me(ActiveUser(user): ActiveUser) -> Json<UserRead> {
    Json(user.into())
}

/// Get a specific user by key.
///
/// Self-access is always permitted; cross-user access requires superuser.
///
/// GET /api/v1/user/{key}
pub async fn read_one(
    State(state): State<Arc<AppState>>,
    ActiveUser(caller): ActiveUser,
    Path(key): Path<String>,
) -> Result<Json<UserRead>, ApiError> {
    let user = users::get(state.store.as_ref(), &key)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if user.key != caller.key && !caller.is_superuser {
        return Err(ApiError::Forbidden("Not authorized".to_string()));
    }

    Ok(Json(user.into()))
}

/// Update the calling user.
///
/// Merge-patch over password, fullname, and username; only fields present
/// in the body are overwritten.
///
/// PATCH /api/v1/user/patch/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    ActiveUser(mut user): ActiveUser,
    Json(payload): Json<SelfUpdate>,
) -> Result<Json<UserRead>, ApiError> {
    if let Some(username) = payload.username {
        if !security::is_valid_email(&username) {
            return Err(ApiError::Validation(
                "username must be a valid email address".to_string(),
            ));
        }
        user.username = username;
    }

    if let Some(password) = payload.password {
        user.hashed_password = security::hash_password(&password, state.config.bcrypt_cost)?;
    }

    if let Some(fullname) = payload.fullname {
        user.fullname = Some(fullname);
    }

    let user = users::save(state.store.as_ref(), user).await?;
    Ok(Json(user.into()))
}

/// Update a user (admin path, merge-patch)
///
/// PATCH /api/v1/user/patch/{key}
pub async fn update_one(
    State(state): State<Arc<AppState>>,
    Superuser(_admin): Superuser,
    Path(key): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserRead>, ApiError> {
    let mut user = users::get(state.store.as_ref(), &key)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if let Some(password) = payload.password {
        user.hashed_password = security::hash_password(&password, state.config.bcrypt_cost)?;
    }

    if let Some(fullname) = payload.fullname {
        user.fullname = Some(fullname);
    }

    let user = users::save(state.store.as_ref(), user).await?;
    Ok(Json(user.into()))
}

/// Delete a user. Administrators cannot delete their own account.
///
/// DELETE /api/v1/user/{key}
pub async fn delete_one(
    State(state): State<Arc<AppState>>,
    Superuser(admin): Superuser,
    Path(key): Path<String>,
) -> Result<Json<UserRead>, ApiError> {
    let user = users::get(state.store.as_ref(), &key)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if user.key == admin.key {
        return Err(ApiError::SelfDeleteForbidden);
    }

    users::delete(state.store.as_ref(), &key).await?;
    Ok(Json(user.into()))
}
