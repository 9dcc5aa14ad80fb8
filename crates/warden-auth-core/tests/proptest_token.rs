//! Property-based tests for token signing and verification
//!
//! These tests verify:
//! - Session tokens roundtrip for arbitrary users
//! - Malformed tokens never panic and are always rejected
//! - Tampering with any byte of a token is detected
//! - Signing key length validation

use proptest::prelude::*;
use std::time::Duration;
use warden_auth_core::{constant_time_str_eq, hash_token, SigningKey, TokenIssuer};
use warden_types::UserId;

fn issuer() -> TokenIssuer {
    TokenIssuer::new(
        SigningKey::new("proptest-secret-0123456789abcdefghij").unwrap(),
        Duration::from_secs(3600),
    )
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_email() -> impl Strategy<Value = String> {
    "[a-z0-9_.+-]{1,20}@[a-z0-9-]{1,20}\\.[a-z]{2,4}"
}

fn arb_malformed_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_-]{0,60}",
        "[a-zA-Z0-9_-]{1,20}\\.[a-zA-Z0-9_-]{1,20}\\.[a-zA-Z0-9_-]{1,20}",
        "[a-zA-Z0-9_-]{1,10}\\.[a-zA-Z0-9_-]{1,10}\\.[a-zA-Z0-9_-]{1,10}\\.[a-zA-Z0-9_-]{1,10}",
        Just("..".to_string()),
        "[!@#$%^&*()]{1,30}",
    ]
}

// ============================================================================
// Signing Key Properties
// ============================================================================

proptest! {
    /// Property: keys of 32+ bytes are accepted, shorter ones rejected
    #[test]
    fn prop_signing_key_length(key in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(SigningKey::new(&key).is_ok(), key.len() >= 32);
    }
}

// ============================================================================
// Session Token Properties
// ============================================================================

proptest! {
    /// Property: signed session tokens verify to the same claims
    #[test]
    fn prop_session_roundtrip(id in any::<i64>(), email in arb_email(), is_admin in any::<bool>()) {
        let issuer = issuer();
        let (token, claims) = issuer.sign_session(UserId(id), &email, is_admin).unwrap();

        let verified = issuer.verify(&token).unwrap();
        prop_assert_eq!(verified.user_id(), Some(UserId(id)));
        prop_assert_eq!(verified, claims);
    }

    /// Property: malformed tokens are rejected without panicking
    #[test]
    fn prop_malformed_token_rejected(token in arb_malformed_token()) {
        let issuer = issuer();
        prop_assert!(issuer.verify(&token).is_err());
        prop_assert!(issuer.verify_api_key(&token).is_err());
    }

    /// Property: changing any character of the signature is detected
    #[test]
    fn prop_signature_tamper_detected(id in any::<i64>(), pos in any::<prop::sample::Index>()) {
        let issuer = issuer();
        let (token, _) = issuer.sign_session(UserId(id), "a@example.com", false).unwrap();

        let sig_start = token.rfind('.').unwrap() + 1;
        let sig_len = token.len() - sig_start;
        let at = sig_start + pos.index(sig_len);

        let mut bytes = token.into_bytes();
        bytes[at] = if bytes[at] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        prop_assert!(issuer.verify(&tampered).is_err());
    }
}

// ============================================================================
// Digest Properties
// ============================================================================

proptest! {
    /// Property: digests are deterministic and only equal for equal input
    #[test]
    fn prop_hash_token_deterministic(a in "[0-9a-f]{64}", b in "[0-9a-f]{64}") {
        prop_assert!(constant_time_str_eq(&hash_token(&a), &hash_token(&a)));
        prop_assert_eq!(hash_token(&a) == hash_token(&b), a == b);
    }
}
