pub mod admin;
pub mod check;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;
use crate::middleware;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Endpoints reachable without a token.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/check_key", post(check::check_key))
}

/// Admin registry endpoints, all behind the shared-secret gate.
pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/add_key", post(admin::add_key))
        .route("/api/delete_key", post(admin::delete_key))
        .route("/api/list_key", get(admin::list_key))
        .route("/api/reset_key", post(admin::reset_key))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::admin_auth,
        ))
}
