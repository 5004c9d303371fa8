pub mod auth;
pub mod comments;
pub mod cors;
pub mod posts;
pub mod upload;
pub mod users;

use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full API with the cross-origin policy and request tracing applied.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.media.max_upload_bytes;
    let cors = cors::cors_layer(&state.config.server.allowed_origins);

    Router::new()
        .route("/api/health", get(health))
        .merge(auth::router())
        .merge(users::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(upload::router(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    cors::reject_foreign_origin,
                ))
                .layer(cors),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
