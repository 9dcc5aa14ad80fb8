//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration failure
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Pool has not been opened, or was closed
    #[error("not connected")]
    NotConnected,

    /// Unique constraint violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// Record not found
    #[error("record not found")]
    NotFound,
}

/// Result alias for repository operations
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Map unique violations to [`DbError::Conflict`], everything else to [`DbError::Sqlx`]
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("{what} already exists"))
            }
            _ => Self::Sqlx(err),
        }
    }
}
