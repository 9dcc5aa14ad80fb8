//! Password hashing
//!
//! Argon2id digests in PHC string format. Hashing is CPU-bound, so the async
//! wrappers run on the blocking pool instead of stalling request tasks.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::Arc;
use tokio::task;

use crate::AuthError;

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 19_456, // 19 MiB
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl HashCost {
    /// Cheapest valid cost; only for tests
    pub const fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// One-way password hasher
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Digest of a random throwaway password at this hasher's cost
    placeholder: Arc<str>,
}

impl PasswordHasher {
    /// Create a hasher with the given cost
    pub fn new(cost: HashCost) -> Result<Self, AuthError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AuthError::Configuration(format!("invalid password hash cost: {e}")))?;
        let throwaway = crate::crypto::random_secret_hex::<32>();
        let placeholder = hash_with(&params, &throwaway)?;

        Ok(Self {
            params,
            placeholder: placeholder.into(),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        argon2_with(&self.params)
    }

    /// Hash `plaintext` with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        hash_with(&self.params, plaintext)
    }

    /// Check `plaintext` against a stored digest.
    ///
    /// Parameters are read from the digest itself, so digests produced under
    /// an older cost still verify. A malformed digest is simply `false`.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            tracing::warn!("stored password digest is not a valid PHC string");
            return false;
        };

        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_async(&self, plaintext: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task failed: {e}")))?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_async(&self, plaintext: String, digest: String) -> bool {
        let hasher = self.clone();
        match task::spawn_blocking(move || hasher.verify(&plaintext, &digest)).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("password verification task failed: {}", e);
                false
            }
        }
    }

    /// Verify against an optional stored digest.
    ///
    /// With no digest the work is still done against the placeholder and the
    /// result is always `false`, so absent and wrong passwords cost the same.
    pub async fn verify_stored_async(&self, plaintext: String, digest: Option<String>) -> bool {
        match digest {
            Some(digest) => self.verify_async(plaintext, digest).await,
            None => {
                let placeholder = self.placeholder.to_string();
                let _ = self.verify_async(plaintext, placeholder).await;
                false
            }
        }
    }
}

fn argon2_with(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

fn hash_with(params: &Params, plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2_with(params)
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashCost::minimal()).unwrap()
    }

    #[test]
    fn test_hash_roundtrip() {
        let hasher = hasher();
        let digest = hasher.hash("correct horse battery staple").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery staple", &digest));
        assert!(!hasher.verify("Correct horse battery staple", &digest));
    }

    #[test]
    fn test_same_password_different_salt() {
        let hasher = hasher();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn test_malformed_digest_is_false() {
        assert!(!hasher().verify("pw", "not-a-phc-string"));
        assert!(!hasher().verify("pw", ""));
    }

    #[test]
    fn test_digest_from_other_cost_still_verifies() {
        let strong = PasswordHasher::new(HashCost {
            memory_kib: 64,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let digest = strong.hash("pw").unwrap();
        assert!(hasher().verify("pw", &digest));
    }

    #[test]
    fn test_invalid_cost_is_configuration_error() {
        let result = PasswordHasher::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let hasher = hasher();
        let digest = hasher.hash_async("pw".to_string()).await.unwrap();
        assert!(hasher.verify_async("pw".to_string(), digest.clone()).await);
        assert!(!hasher.verify_async("nope".to_string(), digest).await);
    }

    #[tokio::test]
    async fn test_verify_stored_without_digest() {
        let hasher = hasher();
        let digest = hasher.hash("pw").unwrap();

        assert!(hasher.verify_stored_async("pw".to_string(), Some(digest)).await);
        assert!(!hasher.verify_stored_async("pw".to_string(), None).await);
        assert!(!hasher.verify_stored_async(String::new(), None).await);
        assert!(hasher.placeholder.starts_with("$argon2id$"));
    }
}
