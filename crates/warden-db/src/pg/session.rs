//! PostgreSQL session repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::DbResult;
use crate::models::{SessionRow, SessionWithUser, UserRow};
use crate::repo::{SessionRepository, UpsertSession};

/// PostgreSQL session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row of the session/user join
#[derive(FromRow)]
struct LiveSessionRow {
    session_id: i64,
    token: String,
    session_created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    user_id: i64,
    email: String,
    username: String,
    password_hash: Option<String>,
    role: String,
    is_active: bool,
    is_admin: bool,
    daily_quota: i32,
    user_created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LiveSessionRow> for SessionWithUser {
    fn from(row: LiveSessionRow) -> Self {
        Self {
            session: SessionRow {
                id: row.session_id,
                user_id: row.user_id,
                token: row.token,
                created_at: row.session_created_at,
                expires_at: row.expires_at,
            },
            user: UserRow {
                id: row.user_id,
                email: row.email,
                username: row.username,
                password_hash: row.password_hash,
                role: row.role,
                is_active: row.is_active,
                is_admin: row.is_admin,
                daily_quota: row.daily_quota,
                created_at: row.user_created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn upsert(&self, session: UpsertSession) -> DbResult<SessionRow> {
        // Single statement so concurrent logins for one user serialize on the
        // unique index instead of racing a find-then-insert.
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO sessions (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET id = nextval(pg_get_serial_sequence('sessions', 'id')),
                token = EXCLUDED.token,
                created_at = NOW(),
                expires_at = EXCLUDED.expires_at
            RETURNING id, user_id, token, created_at, expires_at
            "#,
        )
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_live_by_token(&self, token: &str) -> DbResult<Option<SessionWithUser>> {
        let row = sqlx::query_as::<_, LiveSessionRow>(
            r#"
            SELECT s.id AS session_id, s.token, s.created_at AS session_created_at,
                   s.expires_at, u.id AS user_id, u.email, u.username, u.password_hash,
                   u.role, u.is_active, u.is_admin, u.daily_quota,
                   u.created_at AS user_created_at, u.updated_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionWithUser::from))
    }

    async fn find_live_by_user_id(&self, user_id: i64) -> DbResult<Vec<SessionRow>> {
        let sessions = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, token, created_at, expires_at
            FROM sessions
            WHERE user_id = $1 AND expires_at > NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn delete_by_token(&self, token: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
