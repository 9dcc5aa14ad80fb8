//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: i64) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> DbResult<Option<UserRow>>;

    /// Create a new user. Duplicate email or username yields `DbError::Conflict`.
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Flip the active flag
    async fn set_active(&self, id: i64, active: bool) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub is_admin: bool,
    pub daily_quota: i32,
}

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or replace the single session row owned by `session.user_id`.
    ///
    /// Must be atomic with respect to concurrent calls for the same user.
    async fn upsert(&self, session: UpsertSession) -> DbResult<SessionRow>;

    /// Find a session by exact token with `expires_at > now`, joined with its user
    async fn find_live_by_token(&self, token: &str) -> DbResult<Option<SessionWithUser>>;

    /// Find all sessions for a user with `expires_at > now`
    async fn find_live_by_user_id(&self, user_id: i64) -> DbResult<Vec<SessionRow>>;

    /// Hard delete by token; returns rows removed
    async fn delete_by_token(&self, token: &str) -> DbResult<u64>;

    /// Delete expired sessions
    async fn delete_expired(&self) -> DbResult<u64>;
}

/// Upsert session input
#[derive(Debug, Clone)]
pub struct UpsertSession {
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// API key repository trait
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Find an API key by the literal key string
    async fn find_by_key(&self, key: &str) -> DbResult<Option<ApiKeyRow>>;

    /// Find all API keys for a user, newest first
    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Vec<ApiKeyRow>>;

    /// Active keys of a user last used at or after `since`, ordered by `last_used_at`
    async fn find_active_used_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<ApiKeyRow>>;

    /// Create a new API key
    async fn create(&self, key: CreateApiKey) -> DbResult<ApiKeyRow>;

    /// Increment the usage counter and move `last_used_at` forward
    async fn record_usage(&self, id: i64) -> DbResult<()>;

    /// Set the status of a key owned by `user_id`; returns rows updated
    async fn set_status(&self, user_id: i64, id: i64, status: &str) -> DbResult<u64>;
}

/// Create API key input
#[derive(Debug, Clone)]
pub struct CreateApiKey {
    pub user_id: i64,
    pub key: String,
    pub secret_digest: String,
}
