//! Auth errors

use thiserror::Error;

/// Authentication errors
///
/// Credential failures (`Unauthorized`, `InvalidCredentials`, `TokenExpired`,
/// `BadSignature`) all render as the same 401 at the HTTP boundary. The
/// distinction exists for logs only.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Credential rejected; cause deliberately not carried
    #[error("unauthorized")]
    Unauthorized,

    /// Wrong identifier/password pair, or an identity that cannot log in
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Signature did not verify, or the token was malformed
    #[error("bad signature")]
    BadSignature,

    /// Request fields failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Record missing (e.g. user deleted after token issuance)
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique field already taken
    #[error("conflict: {0}")]
    Conflict(String),

    /// Store read/write failed for reasons unrelated to the credential
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Session upsert failed
    #[error("failed to persist session for user {user_id}: {message}")]
    SessionPersistence { user_id: String, message: String },

    /// Missing or unusable configuration (signing secret, hash cost)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::BadSignature => 401,
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Persistence(_)
            | Self::SessionPersistence { .. }
            | Self::Configuration(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized | Self::TokenExpired | Self::BadSignature => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Persistence(_) | Self::SessionPersistence { .. } => "PERSISTENCE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error describes a rejected credential
    pub fn is_credential_failure(&self) -> bool {
        self.status_code() == 401
    }
}

impl From<warden_db::DbError> for AuthError {
    fn from(err: warden_db::DbError) -> Self {
        match err {
            warden_db::DbError::Conflict(what) => Self::Conflict(what),
            warden_db::DbError::NotFound => Self::NotFound("record".to_string()),
            other => {
                tracing::error!("Database error: {}", other);
                Self::Persistence(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_status() {
        for err in [
            AuthError::Unauthorized,
            AuthError::InvalidCredentials,
            AuthError::TokenExpired,
            AuthError::BadSignature,
        ] {
            assert_eq!(err.status_code(), 401);
            assert!(err.is_credential_failure());
        }
    }

    #[test]
    fn test_token_failures_do_not_leak_cause() {
        assert_eq!(AuthError::TokenExpired.error_code(), "UNAUTHORIZED");
        assert_eq!(AuthError::BadSignature.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_db_error_mapping() {
        let err: AuthError = warden_db::DbError::NotConnected.into();
        assert!(matches!(err, AuthError::Persistence(_)));
        assert_eq!(err.status_code(), 500);

        let err: AuthError = warden_db::DbError::Conflict("user already exists".into()).into();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[test]
    fn test_session_persistence_carries_user_id() {
        let err = AuthError::SessionPersistence {
            user_id: "9007199254740993".to_string(),
            message: "not connected".to_string(),
        };
        assert!(err.to_string().contains("9007199254740993"));
    }
}
