//! Configuration for the Auth API service.

use std::time::Duration;

use warden_auth_core::{AuthConfig, Environment, HashCost};
use warden_db::{PoolOptions, RetryPolicy};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Pool sizing and connect retry
    pub pool: PoolOptions,

    /// Apply migrations at startup
    pub run_migrations: bool,

    /// Log output format
    pub log_format: LogFormat,

    /// Auth core configuration
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let environment: Environment = var("APP_ENV", "development")
            .parse()
            .map_err(|_| ConfigError::Invalid("APP_ENV"))?;

        // Database
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections: u32 = var("DB_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|_| ConfigError::Invalid("DB_MAX_CONNECTIONS"))?;

        let connect_retries: u32 = var("DB_CONNECT_RETRIES", "3")
            .parse()
            .map_err(|_| ConfigError::Invalid("DB_CONNECT_RETRIES"))?;

        let connect_timeout_secs: u64 = var("DB_CONNECT_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|_| ConfigError::Invalid("DB_CONNECT_TIMEOUT_SECS"))?;

        let run_migrations = parse_bool(&var("RUN_MIGRATIONS", "true"))
            .ok_or(ConfigError::Invalid("RUN_MIGRATIONS"))?;

        // Server
        let http_port = var("HTTP_PORT", "8080")
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let log_format = match var("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        // Sessions (default 7 days)
        let session_ttl_hours: u64 = var("SESSION_TTL_HOURS", "168")
            .parse()
            .map_err(|_| ConfigError::Invalid("SESSION_TTL_HOURS"))?;

        let require_live_session = parse_bool(&var("REQUIRE_LIVE_SESSION", "false"))
            .ok_or(ConfigError::Invalid("REQUIRE_LIVE_SESSION"))?;

        // Password hashing
        let defaults = HashCost::default();
        let hash_cost = HashCost {
            memory_kib: var("PASSWORD_HASH_MEMORY_KIB", &defaults.memory_kib.to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PASSWORD_HASH_MEMORY_KIB"))?,
            iterations: var("PASSWORD_HASH_ITERATIONS", &defaults.iterations.to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PASSWORD_HASH_ITERATIONS"))?,
            parallelism: var("PASSWORD_HASH_PARALLELISM", &defaults.parallelism.to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PASSWORD_HASH_PARALLELISM"))?,
        };

        // Signing secret: required in production, checked when the issuer is built
        let jwt_secret = lookup("JWT_SECRET").filter(|s| !s.trim().is_empty());
        if let Some(secret) = &jwt_secret {
            if secret.len() < 32 {
                return Err(ConfigError::Invalid(
                    "JWT_SECRET must be at least 32 characters",
                ));
            }
        } else if environment.is_production() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let session_ttl_secs = session_ttl_hours
            .checked_mul(3600)
            .ok_or(ConfigError::Invalid("SESSION_TTL_HOURS"))?;

        let auth = AuthConfig::new(environment, jwt_secret)
            .with_session_ttl(Duration::from_secs(session_ttl_secs))
            .with_hash_cost(hash_cost)
            .with_require_live_session(require_live_session);

        let pool = PoolOptions::default()
            .with_max_connections(max_connections)
            .with_connect_timeout(Duration::from_secs(connect_timeout_secs))
            .with_retry(RetryPolicy::new().with_max_attempts(connect_retries));

        Ok(Self {
            http_port,
            database_url,
            pool,
            run_migrations,
            log_format,
            auth,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
