//! The seam between the gate and the auth core.

use std::sync::Arc;

use async_trait::async_trait;
use warden_auth_core::{AuthError, AuthService, ResolvedCredential};
use warden_db::{ApiKeyRepository, SessionRepository, UserRepository};

use crate::context::AuthContext;

/// Turns a bearer string into an [`AuthContext`].
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn authenticate(&self, bearer: Option<&str>) -> Result<AuthContext, AuthError>;
}

/// Shared authenticator handed to the gate.
pub type SharedAuthenticator = Arc<dyn Authenticator>;

#[async_trait]
impl<U, S, K> Authenticator for AuthService<U, S, K>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
    K: ApiKeyRepository + 'static,
{
    async fn authenticate(&self, bearer: Option<&str>) -> Result<AuthContext, AuthError> {
        let (credential, profile) = AuthService::authenticate(self, bearer).await?;

        let context = AuthContext::new(profile, credential.kind());
        Ok(match credential {
            ResolvedCredential::ApiKey { key_id, .. } => context.with_api_key(key_id),
            ResolvedCredential::Jwt(_) => context,
        })
    }
}
