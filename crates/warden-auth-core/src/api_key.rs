//! API keys
//!
//! A key is a signed envelope around 32 random bytes. The full key string is
//! stored so it can be looked up literally; the random secret is stored only
//! as a SHA-256 digest and compared in constant time.

use chrono::{DateTime, Months, Utc};
use std::sync::Arc;
use warden_db::{ApiKeyRepository, CreateApiKey, UserRepository};
use warden_types::{ApiKeyId, ApiKeyStatus, ApiKeySummary, UsagePoint, UserId, UserProfile};

use crate::crypto::{constant_time_str_eq, hash_token, random_secret_hex};
use crate::profile::profile_from_row;
use crate::resolver::ResolvedCredential;
use crate::token::{ApiKeyClaims, TokenIssuer};
use crate::AuthError;

/// Freshly minted key. The key string is only ever shown here.
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    pub id: ApiKeyId,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

/// A key that passed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedApiKey {
    pub key_id: ApiKeyId,
    pub user_id: UserId,
    pub claims: ApiKeyClaims,
}

/// Mints, verifies and accounts for API keys
pub struct ApiKeyService<K: ApiKeyRepository, U: UserRepository> {
    issuer: TokenIssuer,
    keys: Arc<K>,
    users: Arc<U>,
}

impl<K: ApiKeyRepository, U: UserRepository> Clone for ApiKeyService<K, U> {
    fn clone(&self) -> Self {
        Self {
            issuer: self.issuer.clone(),
            keys: Arc::clone(&self.keys),
            users: Arc::clone(&self.users),
        }
    }
}

impl<K: ApiKeyRepository, U: UserRepository> ApiKeyService<K, U> {
    /// Create a new API key service
    pub fn new(issuer: TokenIssuer, keys: Arc<K>, users: Arc<U>) -> Self {
        Self {
            issuer,
            keys,
            users,
        }
    }

    /// Mint and persist a new key for `user_id`
    pub async fn generate_api_key(&self, user_id: UserId) -> Result<GeneratedApiKey, AuthError> {
        let secret = random_secret_hex::<32>();
        let claims = ApiKeyClaims {
            key: secret,
            user_id,
            created_at: Utc::now().timestamp_millis(),
        };
        let key = self.issuer.sign(&claims)?;

        let row = self
            .keys
            .create(CreateApiKey {
                user_id: user_id.get(),
                key: key.clone(),
                secret_digest: hash_token(&claims.key),
            })
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, "Failed to store API key: {}", e);
                AuthError::Persistence("failed to store api key".to_string())
            })?;

        tracing::info!(user_id = %user_id, key_id = row.id, "API key created");

        Ok(GeneratedApiKey {
            id: ApiKeyId(row.id),
            key,
            created_at: row.created_at,
        })
    }

    /// Verify a presented key and record its use.
    ///
    /// Every rejection is the same `Unauthorized`; the reason is only logged.
    pub async fn verify_api_key(&self, key: &str) -> Result<VerifiedApiKey, AuthError> {
        let claims = self.issuer.verify_api_key(key).map_err(|e| {
            tracing::debug!("API key rejected: {}", e);
            AuthError::Unauthorized
        })?;

        let row = match self.keys.find_by_key(key).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                tracing::debug!("API key rejected: not issued");
                return Err(AuthError::Unauthorized);
            }
            Err(e) => {
                tracing::error!("Failed to look up API key: {}", e);
                return Err(AuthError::Unauthorized);
            }
        };

        let secret_matches = constant_time_str_eq(&hash_token(&claims.key), &row.secret_digest);
        let owner_matches = row.user_id == claims.user_id.get();
        if !(row.is_active() && secret_matches && owner_matches) {
            tracing::debug!(
                key_id = row.id,
                status = %row.status,
                secret_matches,
                owner_matches,
                "API key rejected"
            );
            return Err(AuthError::Unauthorized);
        }

        self.keys.record_usage(row.id).await.map_err(|e| {
            tracing::error!(key_id = row.id, "Failed to record API key usage: {}", e);
            AuthError::Unauthorized
        })?;

        Ok(VerifiedApiKey {
            key_id: ApiKeyId(row.id),
            user_id: UserId(row.user_id),
            claims,
        })
    }

    /// Signature check only, no store access
    pub fn decode_api_key(&self, key: &str) -> Result<ApiKeyClaims, AuthError> {
        self.issuer.verify_api_key(key)
    }

    /// Load the public profile of whoever owns a resolved credential
    pub async fn get_user_from_token(
        &self,
        resolved: &ResolvedCredential,
        raw_token: &str,
    ) -> Result<UserProfile, AuthError> {
        let user_id = match resolved {
            ResolvedCredential::ApiKey { .. } => self.decode_api_key(raw_token)?.user_id,
            ResolvedCredential::Jwt(claims) => claims.user_id().ok_or_else(|| {
                tracing::debug!(sub = %claims.sub, "Token subject is not a user id");
                AuthError::BadSignature
            })?,
        };

        let user = self
            .users
            .find_by_id(user_id.get())
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %user_id, "Credential owner no longer exists");
                AuthError::NotFound("user".to_string())
            })?;

        if !user.is_active {
            tracing::debug!(user_id = %user_id, "Credential owner is inactive");
            return Err(AuthError::Unauthorized);
        }

        Ok(profile_from_row(&user))
    }

    /// `{date, usage}` for active keys used in the last three months, oldest first
    pub async fn get_api_key_usage_stats(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UsagePoint>, AuthError> {
        let now = Utc::now();
        let since = now.checked_sub_months(Months::new(3)).unwrap_or(now);

        let rows = self
            .keys
            .find_active_used_since(user_id.get(), since)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load API key usage: {}", e);
                AuthError::Persistence("failed to load api key usage".to_string())
            })?;

        let mut series: Vec<UsagePoint> = rows
            .into_iter()
            .filter_map(|row| {
                row.last_used_at.map(|date| UsagePoint {
                    date,
                    usage: row.usage_count,
                })
            })
            .collect();
        series.sort_by_key(|point| point.date);

        Ok(series)
    }

    /// Keys owned by a user, newest first
    pub async fn list_api_keys(&self, user_id: UserId) -> Result<Vec<ApiKeySummary>, AuthError> {
        let rows = self.keys.find_by_user_id(user_id.get()).await?;

        Ok(rows
            .into_iter()
            .map(|row| ApiKeySummary {
                id: ApiKeyId(row.id),
                status: row.status.parse().unwrap_or(ApiKeyStatus::Revoked),
                usage_count: row.usage_count,
                last_used_at: row.last_used_at,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Flip a key owned by `user_id` to revoked
    pub async fn revoke_api_key(&self, user_id: UserId, key_id: ApiKeyId) -> Result<(), AuthError> {
        let updated = self
            .keys
            .set_status(user_id.get(), key_id.get(), ApiKeyStatus::Revoked.as_str())
            .await?;

        if updated == 0 {
            return Err(AuthError::NotFound("api key".to_string()));
        }

        tracing::info!(user_id = %user_id, key_id = %key_id, "API key revoked");
        Ok(())
    }
}

impl<K: ApiKeyRepository, U: UserRepository> std::fmt::Debug for ApiKeyService<K, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
