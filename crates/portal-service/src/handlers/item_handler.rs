use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::auth_handler::AppState;
use crate::errors::ApiError;
use crate::extract::Superuser;
use crate::models::{ItemCreate, ItemRead, ItemUpdate};
use crate::repositories::items;

/// Create a new item
///
/// POST /api/v1/item
pub async fn create_one(
    State(state): State<Arc<AppState>>,
    Superuser(_admin): Superuser,
    Json(payload): Json<ItemCreate>,
) -> Result<Json<ItemRead>, ApiError> {
    if items::name_exists(state.store.as_ref(), &payload.name).await? {
        return Err(ApiError::AlreadyExists("item"));
    }

    let item = items::create(state.store.as_ref(), &payload.name, &payload.description).await?;
    Ok(Json(item.into()))
}

/// List all items. Unauthenticated by design.
///
/// GET /api/v1/item
pub async fn read_all(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ItemRead>>, ApiError> {
    let items = items::list(state.store.as_ref()).await?;
    Ok(Json(items.into_iter().map(ItemRead::from).collect()))
}

/// Get a specific item by key. Unauthenticated by design.
///
/// GET /api/v1/item/{key}
pub async fn read_one(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ItemRead>, ApiError> {
    let item = items::get(state.store.as_ref(), &key)
        .await?
        .ok_or(ApiError::NotFound("item"))?;

    Ok(Json(item.into()))
}

/// Update an item (merge-patch)
///
/// PATCH /api/v1/item/patch/{key}
pub async fn update_one(
    State(state): State<Arc<AppState>>,
    Superuser(_admin): Superuser,
    Path(key): Path<String>,
    Json(payload): Json<ItemUpdate>,
) -> Result<Json<ItemRead>, ApiError> {
    let mut item = items::get(state.store.as_ref(), &key)
        .await?
        .ok_or(ApiError::NotFound("item"))?;

    if let Some(name) = payload.name {
        item.name = name;
    }

    if let Some(description) = payload.description {
        item.description = description;
    }

    let item = items::save(state.store.as_ref(), item).await?;
    Ok(Json(item.into()))
}

/// Delete an item
///
/// DELETE /api/v1/item/{key}
pub async fn delete_one(
    State(state): State<Arc<AppState>>,
    Superuser(_admin): Superuser,
    Path(key): Path<String>,
) -> Result<Json<ItemRead>, ApiError> {
    let item = items::get(state.store.as_ref(), &key)
        .await?
        .ok_or(ApiError::NotFound("item"))?;

    items::delete(state.store.as_ref(), &key).await?;
    Ok(Json(item.into()))
}
