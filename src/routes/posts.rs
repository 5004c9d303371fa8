use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::{Post, PostFilter, PostPatch};
use crate::error::AppResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/user/{user_id}", get(list_user_posts))
}

async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PostFilter>,
) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(state.content.list_posts(&filter)?))
}

async fn list_user_posts(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> AppResult<Json<Vec<Post>>> {
    let filter = PostFilter {
        search: None,
        author_id: Some(user_id),
    };
    Ok(Json(state.content.list_posts(&filter)?))
}

async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> AppResult<Json<Post>> {
    let post = state.content.create_post(
        &claims.id,
        &req.title,
        &req.body,
        req.image_url.as_deref(),
    )?;
    Ok(Json(post))
}

async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Post>> {
    Ok(Json(state.content.get_post(&id)?))
}

async fn update_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(patch): ApiJson<PostPatch>,
) -> AppResult<Json<Post>> {
    Ok(Json(state.content.update_post(&id, &claims.id, patch)?))
}

async fn delete_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Value>> {
    state.content.delete_post(&id, &claims.id)?;
    Ok(Json(json!({ "message": "Post has been deleted!" })))
}
