//! Authentication context types.
//!
//! The [`AuthContext`] is attached to request extensions by the gate and read
//! back by the extractors.

use warden_types::{ApiKeyId, CredentialKind, Role, UserId, UserProfile};

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Owner of the credential, freshly loaded from the store.
    pub profile: UserProfile,
    /// Which credential format was presented.
    pub kind: CredentialKind,
    /// Key id when the caller used an API key.
    pub api_key_id: Option<ApiKeyId>,
}

impl AuthContext {
    /// Create a new auth context.
    #[must_use]
    pub fn new(profile: UserProfile, kind: CredentialKind) -> Self {
        Self {
            profile,
            kind,
            api_key_id: None,
        }
    }

    /// Record the API key that authenticated the request.
    #[must_use]
    pub fn with_api_key(mut self, key_id: ApiKeyId) -> Self {
        self.api_key_id = Some(key_id);
        self
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.profile.id
    }

    /// Check if the caller is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.is_admin || self.profile.role == Role::Admin
    }

    /// Check if the caller signed in with a session token.
    #[must_use]
    pub fn is_session(&self) -> bool {
        self.kind == CredentialKind::Jwt
    }
}
