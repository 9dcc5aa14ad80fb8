//! Database connection lifecycle
//!
//! [`ConnectionManager`] is the only component that opens or closes the pool.
//! It is created once by the process root and shared behind an `Arc`.

use std::time::Duration;

use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{Connection, PgPool};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::{DbError, DbResult};
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Database connection pool type alias
pub type DbPool = PgPool;

/// Pool sizing, timeouts and startup retry behavior
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum connections held by the pool
    pub max_connections: u32,
    /// Bound on opening a connection and on acquiring one from the pool
    pub connect_timeout: Duration,
    /// Retry policy for the initial connect
    pub retry: RetryPolicy,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl PoolOptions {
    /// Set the maximum pool size
    #[must_use]
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connect/acquire timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the startup retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Owns the store connection pool.
///
/// `connect`, `disconnect` and `reset` are the only operations that change
/// which pool is live. Each cycle discards server-side prepared statements so
/// a reused connection never collides with a statement name left behind by a
/// previous owner.
pub struct ConnectionManager {
    database_url: String,
    options: PoolOptions,
    pool: RwLock<Option<PgPool>>,
}

impl ConnectionManager {
    /// Create a manager; no connection is opened until [`connect`](Self::connect).
    pub fn new(database_url: impl Into<String>, options: PoolOptions) -> Self {
        Self {
            database_url: database_url.into(),
            options,
            pool: RwLock::new(None),
        }
    }

    /// Open the pool, retrying with linear backoff.
    ///
    /// Returns the existing pool if already connected.
    pub async fn connect(&self) -> DbResult<PgPool> {
        let mut guard = self.pool.write().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let pool = retry_with_backoff(&self.options.retry, "database connect", |attempt| {
            debug!(attempt, "opening database pool");
            self.open_pool()
        })
        .await?;

        discard_prepared_statements(&pool).await;
        info!(
            max_connections = self.options.max_connections,
            "database connected"
        );

        *guard = Some(pool.clone());
        Ok(pool)
    }

    /// Connect or terminate the process with a non-zero status.
    ///
    /// An unreachable store at startup is fatal.
    pub async fn connect_or_exit(&self) -> PgPool {
        match self.connect().await {
            Ok(pool) => pool,
            Err(e) => {
                error!(
                    error = %e,
                    attempts = self.options.retry.max_attempts,
                    "could not connect to database, exiting"
                );
                std::process::exit(1);
            }
        }
    }

    /// Close the pool. Calling it when not connected is a no-op.
    pub async fn disconnect(&self) {
        let pool = self.pool.write().await.take();
        if let Some(pool) = pool {
            discard_prepared_statements(&pool).await;
            pool.close().await;
            info!("database disconnected");
        }
    }

    /// Disconnect then connect again.
    pub async fn reset(&self) -> DbResult<PgPool> {
        self.disconnect().await;
        self.connect().await
    }

    /// Round-trip `SELECT 1`. Never errors; any failure reads as unhealthy.
    pub async fn health_check(&self) -> bool {
        let Some(pool) = self.pool.read().await.clone() else {
            return false;
        };

        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "database health check failed");
                false
            }
        }
    }

    /// The live pool
    pub async fn pool(&self) -> DbResult<PgPool> {
        self.pool.read().await.clone().ok_or(DbError::NotConnected)
    }

    /// Whether a pool is currently held
    pub async fn is_connected(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> DbResult<()> {
        let pool = self.pool().await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    async fn open_pool(&self) -> Result<PgPool, sqlx::Error> {
        // Every physical connection starts clean, including ones opened lazily
        let open = PgPoolOptions::new()
            .max_connections(self.options.max_connections)
            .acquire_timeout(self.options.connect_timeout)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    discard_on_connection(conn).await;
                    Ok(())
                })
            })
            .connect(&self.database_url);

        match tokio::time::timeout(self.options.connect_timeout, open).await {
            Ok(result) => result,
            Err(_) => Err(sqlx::Error::PoolTimedOut),
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Best-effort removal of prepared statements across the pool.
///
/// Runs on every connection currently idle in the pool; connections opened
/// later are covered by the `after_connect` hook. Errors are logged and
/// swallowed.
async fn discard_prepared_statements(pool: &PgPool) {
    let idle = pool.num_idle().max(1);
    let mut held = Vec::with_capacity(idle);

    // Hold each connection until done so the next acquire yields a different one
    for _ in 0..idle {
        match pool.try_acquire() {
            Some(conn) => held.push(conn),
            None => break,
        }
    }
    if held.is_empty() {
        match pool.acquire().await {
            Ok(conn) => held.push(conn),
            Err(e) => {
                warn!(error = %e, "could not acquire connection to clear prepared statements");
                return;
            }
        }
    }

    for conn in &mut held {
        discard_on_connection(conn).await;
    }
    debug!(connections = held.len(), "prepared statements discarded");
}

/// Drop the client-side statement cache and deallocate anything the server
/// still holds for this connection.
async fn discard_on_connection(conn: &mut PgConnection) {
    if let Err(e) = conn.clear_cached_statements().await {
        warn!(error = %e, "failed to clear cached statements");
    }

    if let Err(e) = sqlx::Executor::execute(&mut *conn, "DEALLOCATE ALL").await {
        warn!(error = %e, "failed to deallocate prepared statements");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_options_defaults() {
        let options = PoolOptions::default();
        assert_eq!(options.max_connections, 10);
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert_eq!(options.retry.max_attempts, 3);
    }

    #[test]
    fn test_pool_options_builder() {
        let options = PoolOptions::default()
            .with_max_connections(2)
            .with_connect_timeout(Duration::from_millis(50))
            .with_retry(RetryPolicy::new().with_max_attempts(1));

        assert_eq!(options.max_connections, 2);
        assert_eq!(options.connect_timeout, Duration::from_millis(50));
        assert_eq!(options.retry.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_health_check_false_when_not_connected() {
        let manager = ConnectionManager::new("postgres://localhost/none", PoolOptions::default());
        assert!(!manager.health_check().await);
        assert!(!manager.is_connected().await);
        assert!(matches!(manager.pool().await, Err(DbError::NotConnected)));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_noop() {
        let manager = ConnectionManager::new("postgres://localhost/none", PoolOptions::default());
        manager.disconnect().await;
        manager.disconnect().await;
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_connect_gives_up_after_retries() {
        // Nothing listens on port 1; every attempt is refused quickly
        let options = PoolOptions::default()
            .with_connect_timeout(Duration::from_millis(500))
            .with_retry(
                RetryPolicy::new()
                    .with_max_attempts(2)
                    .with_base_delay(Duration::from_millis(1)),
            );
        let manager = ConnectionManager::new("postgres://warden@127.0.0.1:1/warden", options);

        assert!(manager.connect().await.is_err());
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_discard_prepared_statements_swallows_errors() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://warden@127.0.0.1:1/warden")
            .unwrap();

        // Unreachable store: logged, not raised
        discard_prepared_statements(&pool).await;
        assert_eq!(pool.size(), 0);
    }
}
