//! Login, session and logout scenarios over in-memory repositories

mod common;

use chrono::{Duration, Utc};
use common::{service, service_with, signup, test_config};
use warden_auth_core::{AuthError, Resolution, ResolvedCredential, SignupRequest};
use warden_db::UserRepository;
use warden_types::{CredentialKind, Role};

#[tokio::test]
async fn test_first_login_creates_one_session_for_seven_days() {
    let (repos, service) = service();
    let user = signup(&service, "alice").await;
    assert_eq!(repos.session_count(), 0);

    let outcome = service.login("alice@example.com", "password123").await.unwrap();

    assert_eq!(repos.session_count(), 1);
    assert_eq!(outcome.profile.id, user.id);
    let row = repos.session_for_user(user.id.get()).unwrap();
    assert_eq!(row.token, outcome.token);

    let lifetime = outcome.expires_at - Utc::now();
    assert!(lifetime > Duration::days(7) - Duration::minutes(1));
    assert!(lifetime <= Duration::days(7));
}

#[tokio::test]
async fn test_second_login_replaces_session() {
    let (repos, service) = service();
    let user = signup(&service, "bob").await;

    let first = service.login("bob", "password123").await.unwrap();
    let second = service.login("bob@example.com", "password123").await.unwrap();

    assert_eq!(repos.session_count(), 1);
    assert_ne!(first.token, second.token);
    assert_eq!(
        repos.session_for_user(user.id.get()).unwrap().token,
        second.token
    );
    assert!(service.sessions().validate_session(&first.token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let (repos, service) = service();
    let user = signup(&service, "carol").await;
    service.login_external("ext@example.com", "ext").await.unwrap();

    let wrong_password = service.login("carol", "password124").await.unwrap_err();
    let unknown = service.login("nobody", "password123").await.unwrap_err();
    let external = service.login("ext@example.com", "anything").await.unwrap_err();

    repos.users.set_active(user.id.get(), false).await.unwrap();
    let inactive = service.login("carol", "password123").await.unwrap_err();

    for err in [wrong_password, unknown, external, inactive] {
        assert!(matches!(err, AuthError::InvalidCredentials), "got {err:?}");
        assert_eq!(err.status_code(), 401);
    }
}

#[tokio::test]
async fn test_signup_conflict_and_validation() {
    let (repos, service) = service();
    let user = signup(&service, "dave").await;
    assert_eq!(user.role, Role::Member);
    assert!(!user.is_admin);

    let duplicate = service
        .signup(SignupRequest {
            email: "DAVE@example.com".to_string(),
            username: "dave2".to_string(),
            password: "password123".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(AuthError::Conflict(_))));

    let short = service
        .signup(SignupRequest {
            email: "erin@example.com".to_string(),
            username: "erin".to_string(),
            password: "short".to_string(),
        })
        .await;
    assert!(matches!(short, Err(AuthError::InvalidInput(_))));

    let at_in_name = service
        .signup(SignupRequest {
            email: "team@example.com".to_string(),
            username: "team@ops".to_string(),
            password: "password123".to_string(),
        })
        .await;
    assert!(matches!(at_in_name, Err(AuthError::InvalidInput(_))));
    assert!(repos.users.find_by_email("team@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_external_login_is_find_or_create() {
    let (repos, service) = service();

    let first = service.login_external("sso@example.com", "sso").await.unwrap();
    let second = service.login_external("SSO@example.com", "sso").await.unwrap();

    assert_eq!(first.profile.id, second.profile.id);
    assert_eq!(repos.session_count(), 1);
    let row = repos.users.find_by_id(first.profile.id.get()).await.unwrap().unwrap();
    assert!(row.password_hash.is_none());
}

#[tokio::test]
async fn test_logout_then_logout_again() {
    let (repos, service) = service();
    signup(&service, "frank").await;
    let outcome = service.login("frank", "password123").await.unwrap();

    service.logout(&outcome.token).await.unwrap();
    service.logout(&outcome.token).await.unwrap();
    assert_eq!(repos.session_count(), 0);
}

#[tokio::test]
async fn test_session_token_authenticates() {
    let (_repos, service) = service();
    let user = signup(&service, "grace").await;
    let outcome = service.login("grace", "password123").await.unwrap();

    let (credential, profile) = service.authenticate(Some(&outcome.token)).await.unwrap();
    assert_eq!(credential.kind(), CredentialKind::Jwt);
    assert_eq!(profile.id, user.id);
}

#[tokio::test]
async fn test_logged_out_token_still_resolves_without_live_session_check() {
    let (_repos, service) = service();
    signup(&service, "heidi").await;
    let outcome = service.login("heidi", "password123").await.unwrap();
    service.logout(&outcome.token).await.unwrap();

    assert!(matches!(
        service.resolve(Some(&outcome.token)).await,
        Resolution::Resolved(ResolvedCredential::Jwt(_))
    ));
}

#[tokio::test]
async fn test_logged_out_token_rejected_with_live_session_check() {
    let (_repos, service) = service_with(test_config().with_require_live_session(true));
    signup(&service, "ivan").await;
    let outcome = service.login("ivan", "password123").await.unwrap();
    assert!(service.resolve(Some(&outcome.token)).await.is_resolved());

    service.logout(&outcome.token).await.unwrap();
    assert!(matches!(
        service.authenticate(Some(&outcome.token)).await,
        Err(AuthError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_session_store_outage_fails_login() {
    let (repos, service) = service();
    signup(&service, "judy").await;
    repos.set_unavailable(true);

    let err = service.login("judy", "password123").await.unwrap_err();
    assert_eq!(err.status_code(), 500);
}
