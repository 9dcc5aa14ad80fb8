//! Warden DB - Credential store
//!
//! SQLx-based persistence for users, sessions and API keys, plus the
//! [`ConnectionManager`] that owns the pool lifecycle.
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_db::{ConnectionManager, PoolOptions, Repositories};
//!
//! let manager = ConnectionManager::new("postgres://localhost/warden", PoolOptions::default());
//! let pool = manager.connect_or_exit().await;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_email("admin@example.com").await?;
//! ```

pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;
pub mod retry;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{ConnectionManager, DbPool, PoolOptions};
pub use repo::*;
pub use retry::{retry_with_backoff, RetryPolicy};
