//! Credential resolution
//!
//! A bearer string may be an API key or a session token; both are HS256
//! envelopes under the same secret, so the only way to tell is to try.
//! API keys go first because they carry usage accounting.

use warden_db::{ApiKeyRepository, SessionRepository, UserRepository};
use warden_types::{ApiKeyId, CredentialKind, UserId};

use crate::api_key::ApiKeyService;
use crate::session::SessionManager;
use crate::token::{SessionClaims, TokenIssuer};
use crate::AuthError;

/// Identity behind an accepted credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    ApiKey { user_id: UserId, key_id: ApiKeyId },
    Jwt(SessionClaims),
}

impl ResolvedCredential {
    /// Credential type tag
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::ApiKey { .. } => CredentialKind::ApiKey,
            Self::Jwt(_) => CredentialKind::Jwt,
        }
    }

    /// Owning user, if the credential names one
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::ApiKey { user_id, .. } => Some(*user_id),
            Self::Jwt(claims) => claims.user_id(),
        }
    }
}

/// Why a bearer string was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    MissingToken,
    InvalidToken,
}

impl UnresolvedReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing token",
            Self::InvalidToken => "invalid or expired token",
        }
    }
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of [`CredentialResolver::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedCredential),
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Collapse to a result; every unresolved case is `Unauthorized`
    pub fn into_result(self) -> Result<ResolvedCredential, AuthError> {
        match self {
            Self::Resolved(credential) => Ok(credential),
            Self::Unresolved(_) => Err(AuthError::Unauthorized),
        }
    }
}

/// Turns a raw bearer string into an identity
pub struct CredentialResolver<U, S, K>
where
    U: UserRepository,
    S: SessionRepository,
    K: ApiKeyRepository,
{
    api_keys: ApiKeyService<K, U>,
    issuer: TokenIssuer,
    /// Present only when session tokens must also have a live row
    sessions: Option<SessionManager<S>>,
}

impl<U, S, K> Clone for CredentialResolver<U, S, K>
where
    U: UserRepository,
    S: SessionRepository,
    K: ApiKeyRepository,
{
    fn clone(&self) -> Self {
        Self {
            api_keys: self.api_keys.clone(),
            issuer: self.issuer.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

impl<U, S, K> CredentialResolver<U, S, K>
where
    U: UserRepository,
    S: SessionRepository,
    K: ApiKeyRepository,
{
    /// Resolver that trusts a session token's signature and expiry alone
    pub fn new(api_keys: ApiKeyService<K, U>, issuer: TokenIssuer) -> Self {
        Self {
            api_keys,
            issuer,
            sessions: None,
        }
    }

    /// Also require a live session row for session tokens
    pub fn with_live_sessions(mut self, sessions: SessionManager<S>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Resolve a bearer string.
    ///
    /// Never fails: faults in either path are logged and surface as
    /// [`UnresolvedReason::InvalidToken`].
    pub async fn resolve(&self, bearer: Option<&str>) -> Resolution {
        let token = match bearer.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Resolution::Unresolved(UnresolvedReason::MissingToken),
        };

        match self.api_keys.verify_api_key(token).await {
            Ok(verified) => {
                return Resolution::Resolved(ResolvedCredential::ApiKey {
                    user_id: verified.user_id,
                    key_id: verified.key_id,
                });
            }
            Err(e) => tracing::debug!("Not an API key ({}), trying session token", e),
        }

        let claims = match self.issuer.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Session token rejected: {}", e);
                return Resolution::Unresolved(UnresolvedReason::InvalidToken);
            }
        };

        if let Some(sessions) = &self.sessions {
            match sessions.validate_session(token).await {
                Ok(Some(live)) => {
                    tracing::trace!(session_id = %live.id(), "Live session found");
                }
                Ok(None) => {
                    tracing::debug!(sub = %claims.sub, "Session token has no live session");
                    return Resolution::Unresolved(UnresolvedReason::InvalidToken);
                }
                Err(e) => {
                    tracing::warn!("Session check failed: {}", e);
                    return Resolution::Unresolved(UnresolvedReason::InvalidToken);
                }
            }
        }

        Resolution::Resolved(ResolvedCredential::Jwt(claims))
    }
}

impl<U, S, K> std::fmt::Debug for CredentialResolver<U, S, K>
where
    U: UserRepository,
    S: SessionRepository,
    K: ApiKeyRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("require_live_session", &self.sessions.is_some())
            .finish_non_exhaustive()
    }
}
