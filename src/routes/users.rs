use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::extractors::ApiPath;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/users/{id}", get(get_user))
}

/// GET /api/users/{id} — public profile, never includes the password hash
async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<User>> {
    state
        .users
        .find_by_id(&id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
