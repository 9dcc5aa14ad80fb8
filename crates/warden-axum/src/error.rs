//! Error types for the request gate and extractors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Access errors.
///
/// Every authentication failure renders the same 401 body; the cause is
/// never disclosed to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// No usable credential, or the credential was rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated, but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            Self::Forbidden(reason) => (StatusCode::FORBIDDEN, "FORBIDDEN", reason.clone()),
        };

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}
