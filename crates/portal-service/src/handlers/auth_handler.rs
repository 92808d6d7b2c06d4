use axum::{
    extract::{Path, State},
    Form, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{Detail, TokenResponse, UserCreate, UserRead};
use crate::services::account_service;
use crate::services::mailer::Mailer;
use crate::store::Store;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub mailer: Mailer,
}

/// Login form, `application/x-www-form-urlencoded` per the OAuth2
/// password-flow convention. Extra form fields are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Handle account signup
///
/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserCreate>,
) -> Result<Json<UserRead>, ApiError> {
    let user = account_service::signup(
        state.store.as_ref(),
        &state.mailer,
        &state.config,
        payload,
    )
    .await?;

    Ok(Json(user))
}

/// Handle email verification
///
/// GET /api/v1/auth/verify/{key}
pub async fn handle_verify(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Detail>, ApiError> {
    account_service::verify(state.store.as_ref(), &key).await?;

    Ok(Json(Detail {
        detail: "User successfully verified".to_string(),
    }))
}

/// Handle login: exchange credentials for a bearer token
///
/// POST /api/v1/auth/token
pub async fn handle_token(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = account_service::login(
        state.store.as_ref(),
        &state.config,
        &form.username,
        &form.password,
    )
    .await?;

    Ok(Json(token))
}
