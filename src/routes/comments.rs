use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::Comment;
use crate::error::AppResult;
use crate::extractors::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: String,
    pub body: String,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub body: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/comments", post(create_comment))
        .route("/api/comments/{id}", put(update_comment).delete(delete_comment))
        .route("/api/comments/post/{post_id}", get(list_comments))
}

async fn create_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> AppResult<Json<Comment>> {
    let comment = state
        .content
        .create_comment(&req.post_id, &claims.id, &req.body)?;
    Ok(Json(comment))
}

async fn list_comments(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<String>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.content.list_comments(&post_id)?))
}

async fn update_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateCommentRequest>,
) -> AppResult<Json<Comment>> {
    Ok(Json(state.content.update_comment(&id, &claims.id, &req.body)?))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Value>> {
    state.content.delete_comment(&id, &claims.id)?;
    Ok(Json(json!({ "message": "Comment has been deleted!" })))
}
