use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::media::{MediaError, MediaHost};

/// Signed uploads to Cloudinary's image upload endpoint.
pub struct CloudinaryHost {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryHost {
    pub fn new(
        api_base: &str,
        cloud_name: &str,
        api_key: &str,
        api_secret: &str,
        folder: &str,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            folder: folder.to_string(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", self.api_base, self.cloud_name)
    }
}

/// Cloudinary request signature: SHA-1 over the sorted signed params, then the secret.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn store(&self, bytes: Bytes, filename: Option<&str>) -> Result<String, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let filename = filename.unwrap_or("upload").to_string();
        let mime = mime_guess::from_path(&filename).first_or_octet_stream();
        let part = Part::bytes(bytes.to_vec())
            .file_name(filename)
            .mime_str(mime.as_ref())?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature", signature);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| "no error detail".to_string());
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(MediaError::Response)?;
        Ok(body.secure_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, Path};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    /// Local stand-in for the Cloudinary upload endpoint.
    async fn fake_upload(Path(cloud): Path<String>, mut multipart: Multipart) -> impl IntoResponse {
        let mut fields = HashMap::new();
        let mut file_len = 0;
        let mut file_name = None;
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                file_name = field.file_name().map(str::to_string);
                file_len = field.bytes().await.unwrap().len();
            } else {
                fields.insert(name, field.text().await.unwrap());
            }
        }

        if cloud == "broken" {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "message": "Invalid Signature" } })),
            );
        }

        let expected = sign(
            &[
                ("folder", fields["folder"].as_str()),
                ("timestamp", fields["timestamp"].as_str()),
            ],
            "shh",
        );
        assert_eq!(fields["signature"], expected);
        assert_eq!(fields["api_key"], "key");

        (
            StatusCode::OK,
            Json(json!({
                "secure_url": format!(
                    "https://res.test/{}/{}/{}-{}",
                    cloud,
                    fields["folder"],
                    file_len,
                    file_name.unwrap_or_default()
                )
            })),
        )
    }

    async fn spawn_fake_host() -> String {
        let app = Router::new().route("/v1_1/{cloud}/image/upload", post(fake_upload));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1_1", addr)
    }

    #[test]
    fn signature_is_hex_sha1_and_order_independent() {
        let a = sign(&[("timestamp", "1"), ("folder", "blog_images")], "secret");
        let b = sign(&[("folder", "blog_images"), ("timestamp", "1")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, sign(&[("folder", "blog_images"), ("timestamp", "1")], "other"));
    }

    #[tokio::test]
    async fn store_posts_signed_multipart() {
        let base = spawn_fake_host().await;
        let host = CloudinaryHost::new(&base, "demo", "key", "shh", "blog_images");
        let url = host
            .store(Bytes::from_static(b"\x89PNG...."), Some("cat.png"))
            .await
            .unwrap();
        assert_eq!(url, "https://res.test/demo/blog_images/8-cat.png");
    }

    #[tokio::test]
    async fn store_surfaces_upstream_error_message() {
        let base = spawn_fake_host().await;
        let host = CloudinaryHost::new(&base, "broken", "key", "shh", "blog_images");
        let err = host
            .store(Bytes::from_static(b"data"), None)
            .await
            .unwrap_err();
        match err {
            MediaError::Rejected { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Invalid Signature");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn store_reports_unreachable_host() {
        let host = CloudinaryHost::new("http://127.0.0.1:1/v1_1", "demo", "key", "shh", "f");
        let err = host
            .store(Bytes::from_static(b"data"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Request(_)), "{}", err);
    }
}
