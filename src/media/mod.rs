pub mod cloudinary;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::{AppError, AppResult};

pub use cloudinary::CloudinaryHost;

/// Why the remote host did not hand back a URL.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("request to media host failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("media host returned {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("unreadable media host response: {0}")]
    Response(#[source] reqwest::Error),
}

/// A remote object store that turns bytes into a public URL.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Store one file and return its public URL.
    async fn store(&self, bytes: Bytes, filename: Option<&str>) -> Result<String, MediaError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedMedia {
    pub url: String,
}

/// Validates an upload and hands it to the configured host exactly once.
#[derive(Clone)]
pub struct MediaUploader {
    host: Arc<dyn MediaHost>,
}

impl MediaUploader {
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self { host }
    }

    pub async fn upload(
        &self,
        file: Option<Bytes>,
        filename: Option<&str>,
    ) -> AppResult<UploadedMedia> {
        let bytes = file
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AppError::Validation("No image provided!".into()))?;

        let size = bytes.len();
        let url = self
            .host
            .store(bytes, filename)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        tracing::info!("Uploaded {} bytes to {}", size, url);
        Ok(UploadedMedia { url })
    }
}
