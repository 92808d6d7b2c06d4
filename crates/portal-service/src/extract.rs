//! Request identity extractors (access control).
//!
//! Resolves the `Authorization: Bearer` header into a user record and
//! layers the access predicates on top:
//!
//! - [`CurrentUser`] - token decodes and names exactly one user
//! - [`ActiveUser`] - additionally `is_active`
//! - [`Superuser`] - additionally `is_superuser`
//!
//! Verification status is checked only at login, not per request.
//! Extraction is read-only; nothing is written to the store.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use std::sync::Arc;

use crate::errors::ApiError;
use crate::handlers::auth_handler::AppState;
use crate::models::User;
use crate::observability::record_token_validation;
use crate::repositories::users;
use crate::security;

/// The authenticated caller.
pub struct CurrentUser(pub User);

/// The authenticated caller, required to be active.
pub struct ActiveUser(pub User);

/// The authenticated caller, required to be a superuser.
pub struct Superuser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let claims =
            security::decode_access_token(token, &state.config.secret_key).map_err(|_| {
                record_token_validation("error");
                ApiError::Unauthorized
            })?;

        // Zero or multiple matches both reject: an ambiguous identity is
        // never defaulted.
        let user = users::get_by_username(state.store.as_ref(), &claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        record_token_validation("success");
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ActiveUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_active {
            return Err(ApiError::Forbidden("Inactive user".to_string()));
        }

        Ok(ActiveUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Superuser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_superuser {
            return Err(ApiError::Forbidden("Not authorized".to_string()));
        }

        Ok(Superuser(user))
    }
}
