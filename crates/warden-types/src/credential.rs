//! Credential kinds

use serde::{Deserialize, Serialize};

/// Which credential format authenticated a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialKind {
    /// Long-lived API key
    ApiKey,
    /// Session token issued at login
    Jwt,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey => write!(f, "apiKey"),
            Self::Jwt => write!(f, "jwt"),
        }
    }
}
