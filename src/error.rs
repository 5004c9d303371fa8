use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Why a request could not be tied to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    Missing,

    #[error("Invalid token")]
    Invalid,

    #[error("Token expired")]
    Expired,

    #[error("Wrong credentials!")]
    WrongCredentials,
}

impl AuthError {
    fn status(self) -> StatusCode {
        match self {
            AuthError::Missing | AuthError::WrongCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Invalid | AuthError::Expired => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(e) => e.status(),
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Upstream(_)
            | AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Hash(_)
            | AppError::Token(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Forbidden(msg) => {
                msg.clone()
            }
            AppError::Auth(e) => e.to_string(),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                "Upload to media host failed".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Hash(e) => {
                tracing::error!("Hashing error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Token(e) => {
                tracing::error!("Token error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        (self.status(), Json(json!({ "message": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
