//! PostgreSQL API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::ApiKeyRow;
use crate::repo::{ApiKeyRepository, CreateApiKey};

/// PostgreSQL API key repository
#[derive(Clone)]
pub struct PgApiKeyRepository {
    pool: PgPool,
}

impl PgApiKeyRepository {
    /// Create a new API key repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PgApiKeyRepository {
    async fn find_by_key(&self, key: &str) -> DbResult<Option<ApiKeyRow>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, user_id, key, secret_digest, status, usage_count,
                   last_used_at, created_at
            FROM api_keys
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Vec<ApiKeyRow>> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, user_id, key, secret_digest, status, usage_count,
                   last_used_at, created_at
            FROM api_keys
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_active_used_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<ApiKeyRow>> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, user_id, key, secret_digest, status, usage_count,
                   last_used_at, created_at
            FROM api_keys
            WHERE user_id = $1 AND status = 'active' AND last_used_at >= $2
            ORDER BY last_used_at ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create(&self, key: CreateApiKey) -> DbResult<ApiKeyRow> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            INSERT INTO api_keys (user_id, key, secret_digest)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, key, secret_digest, status, usage_count,
                      last_used_at, created_at
            "#,
        )
        .bind(key.user_id)
        .bind(&key.key)
        .bind(&key.secret_digest)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, "api key"))?;

        Ok(row)
    }

    async fn record_usage(&self, id: i64) -> DbResult<()> {
        // GREATEST ignores NULL, and never moves last_used_at backwards
        let result = sqlx::query(
            r#"
            UPDATE api_keys
            SET usage_count = usage_count + 1,
                last_used_at = GREATEST(last_used_at, NOW())
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn set_status(&self, user_id: i64, id: i64, status: &str) -> DbResult<u64> {
        let result = sqlx::query("UPDATE api_keys SET status = $3 WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
