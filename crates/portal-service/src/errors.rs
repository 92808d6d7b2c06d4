use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("Password does not meet requirements")]
    WeakPassword,

    #[error("{0}")]
    Validation(String),

    #[error("Could not verify user")]
    InvalidVerification,

    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("You can't delete yourself")]
    SelfDeleteForbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::AlreadyExists(_) => {
                (StatusCode::BAD_REQUEST, "ALREADY_EXISTS", self.to_string())
            }
            ApiError::WeakPassword => {
                (StatusCode::BAD_REQUEST, "WEAK_PASSWORD", self.to_string())
            }
            ApiError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                self.to_string(),
            ),
            ApiError::InvalidVerification => (
                StatusCode::BAD_REQUEST,
                "INVALID_VERIFICATION",
                self.to_string(),
            ),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            ApiError::SelfDeleteForbidden => (
                StatusCode::FORBIDDEN,
                "SELF_DELETE_FORBIDDEN",
                self.to_string(),
            ),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            // Internal details are never echoed to the caller.
            ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "An internal store error occurred".to_string(),
            ),
            ApiError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CRYPTO_ERROR",
                "An internal cryptographic error occurred".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(body)).into_response();

        if matches!(self, ApiError::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::AlreadyExists("user"), StatusCode::BAD_REQUEST),
            (ApiError::WeakPassword, StatusCode::BAD_REQUEST),
            (
                ApiError::Validation("bad input".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ApiError::InvalidVerification, StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ApiError::Forbidden("Inactive user".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (ApiError::SelfDeleteForbidden, StatusCode::FORBIDDEN),
            (ApiError::NotFound("item"), StatusCode::NOT_FOUND),
            (
                ApiError::Store("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_unauthorized_sets_www_authenticate() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );
    }
}
