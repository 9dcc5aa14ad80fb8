//! Cryptographic utilities for secure operations
//!
//! Constant-time comparison, one-way digests for persisted secrets and
//! random secret generation.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Constant-time byte slice comparison.
///
/// Length is not treated as secret; slices of different length compare
/// unequal immediately.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Constant-time string comparison.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// SHA-256 of `token`, hex encoded.
///
/// Used for the API key secret digest; the secret itself is never stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// `N` random bytes, hex encoded (`2 * N` characters).
pub fn random_secret_hex<const N: usize>() -> String {
    let bytes: [u8; N] = rand::rng().random();
    hex::encode(bytes)
}
