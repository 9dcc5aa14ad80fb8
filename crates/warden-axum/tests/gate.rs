//! Request gate behavior over a real router and in-memory repositories

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use warden_auth_core::{
    ApiKeyClaims, AuthConfig, AuthService, Environment, HashCost, SessionClaims, SignupRequest,
};
use warden_axum::{GateConfig, MaybeAuth, RequestGateLayer, RequireAdmin, RequireAuth};
use warden_db::memory::{
    MemoryApiKeyRepository, MemoryRepositories, MemorySessionRepository, MemoryUserRepository,
};
use warden_types::UserId;

const SECRET: &str = "gate-test-secret-0123456789abcdefghij";

type TestService = AuthService<MemoryUserRepository, MemorySessionRepository, MemoryApiKeyRepository>;

async fn me(auth: RequireAuth) -> Json<Value> {
    Json(json!({ "id": auth.user_id(), "kind": auth.kind }))
}

async fn admin(_auth: RequireAdmin) -> &'static str {
    "admin"
}

async fn health(auth: MaybeAuth) -> Json<Value> {
    Json(json!({ "status": "healthy", "authenticated": auth.is_some() }))
}

struct Harness {
    repos: MemoryRepositories,
    service: Arc<TestService>,
    app: Router,
}

fn harness() -> Harness {
    let repos = MemoryRepositories::new();
    let config = AuthConfig::new(Environment::Test, Some(SECRET.to_string()))
        .with_hash_cost(HashCost::minimal());
    let service = Arc::new(
        AuthService::new(
            config,
            Arc::new(repos.users.clone()),
            Arc::new(repos.sessions.clone()),
            Arc::new(repos.api_keys.clone()),
        )
        .unwrap(),
    );

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/auth/me", get(me))
        .route("/api/admin", get(admin))
        .layer(RequestGateLayer::new(service.clone(), GateConfig::default()));

    Harness {
        repos,
        service,
        app,
    }
}

async fn signup(service: &TestService) -> UserId {
    service
        .signup(SignupRequest {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap()
        .id
}

async fn get_with(app: &Router, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(path);
    if let Some(token) = bearer {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn unauthorized_body() -> Value {
    json!({ "error": { "code": "UNAUTHORIZED", "message": "unauthorized" } })
}

#[tokio::test]
async fn test_exempt_path_needs_no_header() {
    let h = harness();
    let (status, body) = get_with(&h.app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_missing_and_garbage_credentials_are_uniform_401() {
    let h = harness();

    for bearer in [None, Some("garbage"), Some("a.b.c")] {
        let (status, body) = get_with(&h.app, "/api/auth/me", bearer).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized_body());
    }
}

#[tokio::test]
async fn test_session_token_passes() {
    let h = harness();
    let user_id = signup(&h.service).await;
    let outcome = h.service.login("alice", "password123").await.unwrap();

    let (status, body) = get_with(&h.app, "/api/auth/me", Some(&outcome.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["kind"], "jwt");
}

#[tokio::test]
async fn test_api_key_passes_and_revoked_key_fails() {
    let h = harness();
    let user_id = signup(&h.service).await;
    let generated = h.service.generate_api_key(user_id).await.unwrap();

    let (status, body) = get_with(&h.app, "/api/auth/me", Some(&generated.key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "apiKey");

    h.service.revoke_api_key(user_id, generated.id).await.unwrap();
    let (status, body) = get_with(&h.app, "/api/auth/me", Some(&generated.key)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, unauthorized_body());
}

#[tokio::test]
async fn test_expired_token_fails() {
    let h = harness();
    let user_id = signup(&h.service).await;

    let mut claims = SessionClaims::new(
        user_id,
        "alice@example.com",
        false,
        std::time::Duration::ZERO,
    );
    claims.iat -= 7200;
    claims.exp -= 3600;
    let token = h.service.issuer().sign(&claims).unwrap();

    let (status, _) = get_with(&h.app, "/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_never_issued_key_fails() {
    let h = harness();
    let user_id = signup(&h.service).await;
    let forged = h
        .service
        .issuer()
        .sign(&ApiKeyClaims {
            key: "cd".repeat(32),
            user_id,
            created_at: 0,
        })
        .unwrap();

    let (status, _) = get_with(&h.app, "/api/auth/me", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_outage_is_401_not_500() {
    let h = harness();
    signup(&h.service).await;
    let outcome = h.service.login("alice", "password123").await.unwrap();
    h.repos.set_unavailable(true);

    let (status, body) = get_with(&h.app, "/api/auth/me", Some(&outcome.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, unauthorized_body());
}

#[tokio::test]
async fn test_admin_route_forbidden_for_member() {
    let h = harness();
    signup(&h.service).await;
    let outcome = h.service.login("alice", "password123").await.unwrap();

    let (status, body) = get_with(&h.app, "/api/admin", Some(&outcome.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}
