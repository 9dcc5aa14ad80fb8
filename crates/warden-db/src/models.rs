//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    /// `None` for identities created through an external provider
    pub password_hash: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub daily_quota: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRow {
    /// Whether the session is still live at `now`
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A live session together with its owner
#[derive(Debug, Clone)]
pub struct SessionWithUser {
    pub session: SessionRow,
    pub user: UserRow,
}

/// API key row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyRow {
    pub id: i64,
    pub user_id: i64,
    /// The full signed key string as handed to the client
    pub key: String,
    /// SHA-256 hex digest of the random secret embedded in the key
    pub secret_digest: String,
    pub status: String,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiKeyRow {
    /// Status column equals `active`
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}
