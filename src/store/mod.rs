pub mod content;
pub mod users;

pub use content::ContentStore;
pub use users::CredentialStore;

use chrono::{SecondsFormat, Utc};

/// Current time in the stored timestamp format (RFC 3339, UTC, milliseconds).
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Trim a required text field, rejecting blank input.
pub(crate) fn require_text(value: &str, field: &str) -> Result<String, crate::error::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::AppError::Validation(format!(
            "{} is required",
            field
        )));
    }
    Ok(trimmed.to_string())
}
