//! Configuration types for the auth core

use std::time::Duration;

use crate::password::HashCost;
use crate::AuthError;

/// Signing secret used outside production when none is configured.
///
/// Never accepted when the environment is [`Environment::Production`].
pub const DEV_SIGNING_SECRET: &str = "warden-development-signing-secret-not-for-prod";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Auth core configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Deployment environment; decides whether a missing secret is fatal
    pub environment: Environment,
    /// HS256 secret for session tokens and API keys
    pub jwt_secret: Option<String>,
    /// Lifetime of session tokens and session rows
    pub session_ttl: Duration,
    /// Password hashing cost
    pub hash_cost: HashCost,
    /// Also require a live session row when resolving a session token
    pub require_live_session: bool,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(environment: Environment, jwt_secret: Option<String>) -> Self {
        Self {
            environment,
            jwt_secret,
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            hash_cost: HashCost::default(),
            require_live_session: false,
        }
    }

    /// Set session lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set password hashing cost
    pub fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Require a live session row for session tokens
    pub fn with_require_live_session(mut self, require: bool) -> Self {
        self.require_live_session = require;
        self
    }

    /// Secret to sign with.
    ///
    /// Production fails closed when no secret is configured. Other
    /// environments fall back to [`DEV_SIGNING_SECRET`] with a warning.
    pub fn signing_secret(&self) -> Result<String, AuthError> {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
            _ if self.environment.is_production() => Err(AuthError::Configuration(
                "JWT_SECRET must be set in production".to_string(),
            )),
            _ => {
                tracing::warn!(
                    environment = ?self.environment,
                    "JWT_SECRET not set, using development signing secret"
                );
                Ok(DEV_SIGNING_SECRET.to_string())
            }
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("environment", &self.environment)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("session_ttl", &self.session_ttl)
            .field("hash_cost", &self.hash_cost)
            .field("require_live_session", &self.require_live_session)
            .finish()
    }
}
