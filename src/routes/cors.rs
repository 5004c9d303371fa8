use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::AppError;
use crate::state::AppState;

/// Reflects allow-listed origins only, with credentials.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Skipping malformed allowed origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}

/// Refuse cross-origin requests from origins outside the allow-list.
/// Requests without an `Origin` header are not cross-origin and pass through.
pub async fn reject_foreign_origin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .map(|o| o.to_str().unwrap_or_default().to_string());

    if let Some(origin) = origin {
        if !is_allowed(&state.config.server.allowed_origins, &origin) {
            tracing::warn!("Blocked by CORS: {}", origin);
            return AppError::Forbidden("Not allowed by CORS".into()).into_response();
        }
    }

    next.run(request).await
}

fn is_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|a| a == origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_matching_is_exact() {
        let allowed = vec!["http://localhost:5173".to_string()];
        assert!(is_allowed(&allowed, "http://localhost:5173"));
        assert!(!is_allowed(&allowed, "http://localhost:5174"));
        assert!(!is_allowed(&allowed, "http://localhost:5173.evil.com"));
        assert!(!is_allowed(&allowed, ""));
    }
}
