use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use ecowear_shared::TokenError;
use ecowear_store::StoreError;

/// The error taxonomy exposed by the API. Every failure is terminal for the
/// request; the caller is told the kind (status code) and a message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid credential, insufficient role for the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Required field missing or wrong shape.
    #[error("{0}")]
    Validation(String),

    /// Storage-layer failure, not further classified.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            other => {
                tracing::error!(error = %other, "storage failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::Unauthorized(e.to_string())
    }
}

/// Reject a missing body field with a `Validation` error.
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}

/// Like [`require`], but also rejects blank strings.
pub fn require_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    let text = require(value, field)?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(text)
}

/// Reject a negative or non-finite numeric field with a `Validation` error.
pub fn non_negative(value: f64, field: &str) -> Result<f64, ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(value)
}
