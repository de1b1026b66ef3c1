use qrlink_web::{ResponseError, StatusCode};

/// Rejected input on the store path. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("cdc_id must not be empty")]
    EmptyCredential,

    #[error("session_id must not be empty")]
    EmptySessionToken,
}

impl ResponseError for ValidationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Trim `session_id`, rejecting blank values.
pub fn normalize_session(session_id: &str) -> Result<&str, ValidationError> {
    match session_id.trim() {
        "" => Err(ValidationError::EmptySessionToken),
        trimmed => Ok(trimmed),
    }
}

/// Trim `cdc_id`, rejecting blank values.
pub fn normalize_credential(cdc_id: &str) -> Result<&str, ValidationError> {
    match cdc_id.trim() {
        "" => Err(ValidationError::EmptyCredential),
        trimmed => Ok(trimmed),
    }
}
