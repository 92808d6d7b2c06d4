use axum::{
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth_handler, item_handler, user_handler};

pub fn build_routes(
    state: Arc<auth_handler::AppState>,
    metrics_handle: PrometheusHandle,
) -> Router {
    Router::new()
        // Account lifecycle
        .route("/api/v1/auth/signup", post(auth_handler::handle_signup))
        .route("/api/v1/auth/verify/:key", get(auth_handler::handle_verify))
        .route("/api/v1/auth/token", post(auth_handler::handle_token))
        // User CRUD
        .route(
            "/api/v1/user",
            post(user_handler::create_one).get(user_handler::read_all),
        )
        .route("/api/v1/user/me", get(user_handler::read_me))
        .route("/api/v1/user/patch/me", patch(user_handler::update_me))
        .route("/api/v1/user/patch/:key", patch(user_handler::update_one))
        .route(
            "/api/v1/user/:key",
            get(user_handler::read_one).delete(user_handler::delete_one),
        )
        // Item CRUD (reads are public)
        .route(
            "/api/v1/item",
            post(item_handler::create_one).get(item_handler::read_all),
        )
        .route("/api/v1/item/patch/:key", patch(item_handler::update_one))
        .route(
            "/api/v1/item/:key",
            get(item_handler::read_one).delete(item_handler::delete_one),
        )
        // Health check
        .route("/health", get(health_check))
        // Prometheus exposition
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
