//! Signed tokens (HS256)
//!
//! One secret signs two envelope types:
//! - [`SessionClaims`]: expiry-bearing tokens handed out at login
//! - [`ApiKeyClaims`]: non-expiring wrappers around an API key secret

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use warden_types::UserId;

use crate::crypto::random_secret_hex;
use crate::{AuthConfig, AuthError};

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID, decimal string)
    pub sub: String,
    /// User email
    pub email: String,
    /// Administrator flag at issuance
    pub is_admin: bool,
    /// Issued at (seconds)
    pub iat: i64,
    /// Expiration (seconds)
    pub exp: i64,
    /// Unique token id; two logins in the same second still differ
    pub jti: String,
}

impl SessionClaims {
    /// Claims for `user_id` valid for `ttl` from now
    pub fn new(user_id: UserId, email: impl Into<String>, is_admin: bool, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            is_admin,
            iat: now,
            exp: now.saturating_add(ttl_secs),
            jti: random_secret_hex::<16>(),
        }
    }

    /// The subject as a user id
    pub fn user_id(&self) -> Option<UserId> {
        UserId::parse(&self.sub).ok()
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Payload wrapped inside an API key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyClaims {
    /// 32 random bytes, hex encoded
    pub key: String,
    /// Owning user
    pub user_id: UserId,
    /// Creation time (milliseconds)
    pub created_at: i64,
}

/// Pre-validated HS256 key pair.
#[derive(Clone)]
pub struct SigningKey {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    key_length: usize,
}

impl SigningKey {
    /// Minimum allowed key length in bytes (256 bits)
    pub const MIN_KEY_LENGTH: usize = 32;

    /// Create a signing key from a secret.
    ///
    /// # Errors
    /// Returns error if the secret is shorter than 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SigningKeyError> {
        let secret = secret.as_ref();
        if secret.len() < Self::MIN_KEY_LENGTH {
            return Err(SigningKeyError::KeyTooShort {
                actual: secret.len(),
                minimum: Self::MIN_KEY_LENGTH,
            });
        }
        Ok(Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            key_length: secret.len(),
        })
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_length", &self.key_length)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when creating a signing key
#[derive(Debug, Clone, thiserror::Error)]
pub enum SigningKeyError {
    #[error("signing key too short: got {actual} bytes, need at least {minimum}")]
    KeyTooShort { actual: usize, minimum: usize },
}

/// Signs and verifies tokens with the server secret.
///
/// An issuer without a key fails every `sign` with `Configuration` and
/// rejects every `verify`.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    key: Option<SigningKey>,
    session_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from a key
    pub fn new(key: SigningKey, session_ttl: Duration) -> Self {
        Self {
            key: Some(key),
            session_ttl,
        }
    }

    /// Issuer with no secret configured
    pub fn without_key(session_ttl: Duration) -> Self {
        Self {
            key: None,
            session_ttl,
        }
    }

    /// Resolve the secret from config (fails closed in production)
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let secret = config.signing_secret()?;
        let key = SigningKey::new(secret).map_err(|e| AuthError::Configuration(e.to_string()))?;
        Ok(Self::new(key, config.session_ttl))
    }

    /// Session lifetime applied by [`sign_session`](Self::sign_session)
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Whether a secret is configured
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    fn key(&self) -> Result<&SigningKey, AuthError> {
        self.key.as_ref().ok_or_else(|| {
            AuthError::Configuration("no signing secret configured".to_string())
        })
    }

    /// Sign arbitrary claims
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        let key = self.key()?;
        encode(&Header::new(Algorithm::HS256), claims, &key.encoding).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AuthError::Internal("failed to sign token".to_string())
        })
    }

    /// Mint a session token for a user, valid for the configured TTL
    pub fn sign_session(
        &self,
        user_id: UserId,
        email: &str,
        is_admin: bool,
    ) -> Result<(String, SessionClaims), AuthError> {
        let claims = SessionClaims::new(user_id, email, is_admin, self.session_ttl);
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    /// Verify a session token.
    ///
    /// Fails with `TokenExpired` or `BadSignature` (which also covers
    /// malformed input and a missing secret).
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        self.decode_with(token, &validation)
    }

    /// Verify an API key envelope. API keys carry no expiry.
    pub fn verify_api_key(&self, token: &str) -> Result<ApiKeyClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        self.decode_with(token, &validation)
    }

    fn decode_with<T: DeserializeOwned>(
        &self,
        token: &str,
        validation: &Validation,
    ) -> Result<T, AuthError> {
        let Some(key) = self.key.as_ref() else {
            tracing::debug!("Token rejected: no signing secret configured");
            return Err(AuthError::BadSignature);
        };

        let data = decode::<T>(token, &key.decoding, validation).map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::BadSignature,
            }
        })?;

        Ok(data.claims)
    }
}
