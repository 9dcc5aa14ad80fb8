//! API key scenarios through the auth service

mod common;

use common::{service, signup, test_issuer};
use std::time::Duration;
use warden_auth_core::{ApiKeyClaims, AuthError, Resolution, ResolvedCredential};
use warden_types::{ApiKeyStatus, CredentialKind};

#[tokio::test]
async fn test_api_key_authenticates_and_counts_usage() {
    let (repos, service) = service();
    let user = signup(&service, "alice").await;
    let generated = service.generate_api_key(user.id).await.unwrap();

    for _ in 0..3 {
        let (credential, profile) = service.authenticate(Some(&generated.key)).await.unwrap();
        assert_eq!(credential.kind(), CredentialKind::ApiKey);
        assert_eq!(profile.id, user.id);
    }

    assert_eq!(repos.api_key(generated.id.get()).unwrap().usage_count, 3);
    let series = service.api_key_usage_stats(user.id).await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].usage, 3);
}

#[tokio::test]
async fn test_forged_key_is_not_accounted() {
    let (repos, service) = service();
    let user = signup(&service, "bob").await;
    let real = service.generate_api_key(user.id).await.unwrap();

    let forged = test_issuer(Duration::from_secs(60))
        .sign(&ApiKeyClaims {
            key: "ff".repeat(32),
            user_id: user.id,
            created_at: 0,
        })
        .unwrap();

    // Validly signed but never issued: not an API key, not a session token
    assert!(matches!(
        service.resolve(Some(&forged)).await,
        Resolution::Unresolved(_)
    ));
    assert!(matches!(
        service.api_keys().verify_api_key(&forged).await,
        Err(AuthError::Unauthorized)
    ));
    assert_eq!(repos.api_key(real.id.get()).unwrap().usage_count, 0);
}

#[tokio::test]
async fn test_revoked_key_stops_resolving() {
    let (_repos, service) = service();
    let user = signup(&service, "carol").await;
    let generated = service.generate_api_key(user.id).await.unwrap();
    assert!(matches!(
        service.resolve(Some(&generated.key)).await,
        Resolution::Resolved(ResolvedCredential::ApiKey { .. })
    ));

    service.revoke_api_key(user.id, generated.id).await.unwrap();

    assert!(matches!(
        service.authenticate(Some(&generated.key)).await,
        Err(AuthError::Unauthorized)
    ));
    let listed = service.list_api_keys(user.id).await.unwrap();
    assert_eq!(listed[0].status, ApiKeyStatus::Revoked);
    assert!(service.api_key_usage_stats(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_keys_are_scoped_to_owner() {
    let (_repos, service) = service();
    let owner = signup(&service, "dave").await;
    let other = signup(&service, "erin").await;
    let generated = service.generate_api_key(owner.id).await.unwrap();

    assert!(service.list_api_keys(other.id).await.unwrap().is_empty());
    assert!(matches!(
        service.revoke_api_key(other.id, generated.id).await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_decode_does_not_touch_store() {
    let (repos, service) = service();
    let user = signup(&service, "frank").await;
    let generated = service.generate_api_key(user.id).await.unwrap();
    repos.set_unavailable(true);

    let claims = service.api_keys().decode_api_key(&generated.key).unwrap();
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.key.len(), 64);
}
