use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};

use crate::error::{AppError, AppResult};
use crate::media::UploadedMedia;
use crate::state::AppState;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/api/upload",
        post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

/// POST /api/upload — multipart, single field named `file`
async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadedMedia>> {
    let mut multipart =
        multipart.map_err(|_| AppError::Validation("No image provided!".into()))?;

    let mut file = None;
    let mut filename = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            file = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?,
            );
            break;
        }
    }

    let media = state.media.upload(file, filename.as_deref()).await?;
    Ok(Json(media))
}
