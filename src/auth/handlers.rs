use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::token::Claims;
use crate::db::models::User;
use crate::error::AppResult;
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

// -- Handlers --

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<Json<User>> {
    let user = state
        .users
        .register(&req.username, &req.email, &req.password)
        .await?;
    Ok(Json(user))
}

/// POST /api/auth/login — sets the session cookie
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Response> {
    let user = state.users.authenticate(&req.email, &req.password).await?;
    let token = state.tokens.issue(&user)?;

    tracing::info!("User {} logged in", user.id);

    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.tokens.ttl_secs(),
    );
    Ok(([(header::SET_COOKIE, cookie)], Json(user)).into_response())
}

/// GET /api/auth/logout — clears the session cookie
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(
            header::SET_COOKIE,
            clear_session_cookie(&state.config.auth.cookie_name),
        )],
        Json(json!({ "message": "User logged out successfully!" })),
    )
        .into_response()
}

/// GET /api/auth/refetch — echo the decoded session claims
pub async fn refetch(AuthUser(claims): AuthUser) -> Json<Claims> {
    Json(claims)
}
