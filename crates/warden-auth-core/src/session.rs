//! Server-side session lifecycle
//!
//! A session row says a signed token is still live, independent of the
//! token's own expiry. Each user owns at most one row: a new login replaces
//! it in place.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use warden_db::{SessionRepository, SessionRow, SessionWithUser, UpsertSession, UserRow};
use warden_types::{SessionId, UserId};

use crate::AuthError;

/// A live session and its owner
#[derive(Debug, Clone)]
pub struct LiveSession {
    pub session: SessionRow,
    pub user: UserRow,
}

impl LiveSession {
    pub fn id(&self) -> SessionId {
        SessionId(self.session.id)
    }

    pub fn user_id(&self) -> UserId {
        UserId(self.user.id)
    }
}

impl From<SessionWithUser> for LiveSession {
    fn from(row: SessionWithUser) -> Self {
        Self {
            session: row.session,
            user: row.user,
        }
    }
}

/// Session manager handles session creation, validation and deletion
pub struct SessionManager<R: SessionRepository> {
    repo: Arc<R>,
}

impl<R: SessionRepository> Clone for SessionManager<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: SessionRepository> SessionManager<R> {
    /// Create a new session manager
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Create or replace the session for `user_id`.
    ///
    /// Any store failure carries the user id for diagnosis.
    pub async fn create_session(
        &self,
        user_id: UserId,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionRow, AuthError> {
        let upsert = UpsertSession {
            user_id: user_id.get(),
            token: token.into(),
            expires_at,
        };

        self.repo.upsert(upsert).await.map_err(|e| {
            tracing::error!(user_id = %user_id, "Failed to create session: {}", e);
            AuthError::SessionPersistence {
                user_id: user_id.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Look up a live session by exact token.
    ///
    /// `Ok(None)` means not authenticated, not a fault.
    pub async fn validate_session(&self, token: &str) -> Result<Option<LiveSession>, AuthError> {
        let found = self.repo.find_live_by_token(token).await.map_err(|e| {
            tracing::error!("Failed to find session: {}", e);
            AuthError::Persistence("failed to validate session".to_string())
        })?;

        if found.is_none() {
            tracing::debug!("No live session for token");
        }

        Ok(found.map(LiveSession::from))
    }

    /// Delete the session holding `token`. Deleting a missing token succeeds.
    pub async fn delete_session(&self, token: &str) -> Result<(), AuthError> {
        let removed = self.repo.delete_by_token(token).await.map_err(|e| {
            tracing::error!("Failed to delete session: {}", e);
            AuthError::Persistence("failed to delete session".to_string())
        })?;

        tracing::debug!(removed, "Session delete");
        Ok(())
    }

    /// All live sessions for a user
    pub async fn find_active_sessions(&self, user_id: UserId) -> Result<Vec<SessionRow>, AuthError> {
        self.repo
            .find_live_by_user_id(user_id.get())
            .await
            .map_err(|e| {
                tracing::error!("Failed to get sessions: {}", e);
                AuthError::Persistence("failed to get sessions".to_string())
            })
    }

    /// Remove expired rows. Never needed for correctness; reads filter on expiry.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let purged = self.repo.delete_expired().await.map_err(|e| {
            tracing::error!("Failed to purge sessions: {}", e);
            AuthError::Persistence("failed to purge sessions".to_string())
        })?;

        if purged > 0 {
            tracing::info!(purged, "Purged expired sessions");
        }
        Ok(purged)
    }
}

impl<R: SessionRepository> std::fmt::Debug for SessionManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}
