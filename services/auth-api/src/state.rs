//! Application state

use std::sync::Arc;

use async_trait::async_trait;
use warden_auth_core::AuthService;
use warden_db::pg::{PgApiKeyRepository, PgSessionRepository, PgUserRepository};
use warden_db::{ApiKeyRepository, ConnectionManager, SessionRepository, UserRepository};

/// The repository set a deployment runs on
pub trait Backend: Send + Sync + 'static {
    type Users: UserRepository + 'static;
    type Sessions: SessionRepository + 'static;
    type ApiKeys: ApiKeyRepository + 'static;
}

/// PostgreSQL-backed deployment
pub struct Postgres;

impl Backend for Postgres {
    type Users = PgUserRepository;
    type Sessions = PgSessionRepository;
    type ApiKeys = PgApiKeyRepository;
}

/// Type alias for the auth service over a backend
pub type AuthServiceImpl<B> =
    AuthService<<B as Backend>::Users, <B as Backend>::Sessions, <B as Backend>::ApiKeys>;

/// Store connectivity check behind `/ready`
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn is_ready(&self) -> bool;
}

#[async_trait]
impl ReadinessProbe for ConnectionManager {
    async fn is_ready(&self) -> bool {
        self.health_check().await
    }
}

/// Application state shared across handlers
pub struct AppState<B: Backend> {
    /// Auth service for logins, sessions and API keys
    pub auth: Arc<AuthServiceImpl<B>>,
    /// Store readiness
    pub readiness: Arc<dyn ReadinessProbe>,
}

impl<B: Backend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            readiness: Arc::clone(&self.readiness),
        }
    }
}

impl<B: Backend> AppState<B> {
    /// Create new application state
    pub fn new(auth: AuthServiceImpl<B>, readiness: Arc<dyn ReadinessProbe>) -> Self {
        Self {
            auth: Arc::new(auth),
            readiness,
        }
    }
}
