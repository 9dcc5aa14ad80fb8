//! Error types for the Auth API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use warden_auth_core::AuthError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Auth(e) => e.error_code(),
        }
    }

    /// Message safe to show the caller
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(_) => self.to_string(),
            Self::Auth(e) if e.is_credential_failure() => {
                e.error_code().to_lowercase().replace('_', " ")
            }
            Self::Auth(
                e @ (AuthError::InvalidInput(_) | AuthError::NotFound(_) | AuthError::Conflict(_)),
            ) => e.to_string(),
            Self::Auth(_) => "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors
        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_hide_cause() {
        let expired = ApiError::from(AuthError::TokenExpired);
        assert_eq!(expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.public_message(), "unauthorized");

        let login = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(login.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(login.public_message(), "invalid credentials");
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err = ApiError::from(AuthError::Persistence("connection refused".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal error");
    }

    #[test]
    fn test_client_errors_pass_through() {
        let err = ApiError::from(AuthError::Conflict("user already exists".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.public_message().contains("already exists"));

        let err = ApiError::BadRequest("invalid id".into());
        assert_eq!(err.error_code(), "BAD_REQUEST");
    }
}
