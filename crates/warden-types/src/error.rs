//! Common error types

use thiserror::Error;

/// Errors produced when parsing domain values from strings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Identifier is not a valid 64-bit integer
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Unknown role name
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Unknown API key status
    #[error("invalid api key status: {0}")]
    InvalidApiKeyStatus(String),
}
