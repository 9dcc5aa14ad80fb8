//! Common test utilities for warden-auth-core integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use warden_auth_core::{
    AuthConfig, AuthService, Environment, HashCost, SignupRequest, SigningKey, TokenIssuer,
};
use warden_db::memory::{
    MemoryApiKeyRepository, MemoryRepositories, MemorySessionRepository, MemoryUserRepository,
};
use warden_types::UserProfile;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub type TestService =
    AuthService<MemoryUserRepository, MemorySessionRepository, MemoryApiKeyRepository>;

/// Test config: cheap hashing, fixed secret
pub fn test_config() -> AuthConfig {
    AuthConfig::new(Environment::Test, Some(TEST_SECRET.to_string()))
        .with_hash_cost(HashCost::minimal())
}

/// Issuer over [`TEST_SECRET`] with a custom session lifetime
pub fn test_issuer(ttl: Duration) -> TokenIssuer {
    TokenIssuer::new(SigningKey::new(TEST_SECRET).unwrap(), ttl)
}

/// Service plus a handle on its store
pub fn service_with(config: AuthConfig) -> (MemoryRepositories, TestService) {
    let repos = MemoryRepositories::new();
    let service = AuthService::new(
        config,
        Arc::new(repos.users.clone()),
        Arc::new(repos.sessions.clone()),
        Arc::new(repos.api_keys.clone()),
    )
    .unwrap();
    (repos, service)
}

pub fn service() -> (MemoryRepositories, TestService) {
    service_with(test_config())
}

/// Sign up `name` with password `password123`
pub async fn signup(service: &TestService, name: &str) -> UserProfile {
    service
        .signup(SignupRequest {
            email: format!("{name}@example.com"),
            username: name.to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap()
}
