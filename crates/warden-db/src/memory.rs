//! In-memory repository implementations
//!
//! Backed by `DashMap`s that share one [`MemoryStore`], so the session join
//! sees the same users the user repository writes. Enabled with the `memory`
//! feature; used by tests across the workspace.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{DbError, DbResult};
use crate::models::{ApiKeyRow, SessionRow, SessionWithUser, UserRow};
use crate::repo::{
    ApiKeyRepository, CreateApiKey, CreateUser, SessionRepository, UpsertSession, UserRepository,
};

/// Shared tables
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<i64, UserRow>,
    /// Keyed by owning user: the map itself enforces one row per user
    sessions: DashMap<i64, SessionRow>,
    api_keys: DashMap<i64, ApiKeyRow>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn check_available(&self) -> DbResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::NotConnected);
        }
        Ok(())
    }
}

/// All in-memory repositories bundled together
#[derive(Clone)]
pub struct MemoryRepositories {
    pub store: Arc<MemoryStore>,
    pub users: MemoryUserRepository,
    pub sessions: MemorySessionRepository,
    pub api_keys: MemoryApiKeyRepository,
}

impl Default for MemoryRepositories {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepositories {
    /// Create an empty store
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            users: MemoryUserRepository(Arc::clone(&store)),
            sessions: MemorySessionRepository(Arc::clone(&store)),
            api_keys: MemoryApiKeyRepository(Arc::clone(&store)),
            store,
        }
    }

    /// Make every call fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.store.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of session rows, live or expired
    pub fn session_count(&self) -> usize {
        self.store.sessions.len()
    }

    /// Raw session row for a user
    pub fn session_for_user(&self, user_id: i64) -> Option<SessionRow> {
        self.store.sessions.get(&user_id).map(|r| r.value().clone())
    }

    /// Raw API key row
    pub fn api_key(&self, id: i64) -> Option<ApiKeyRow> {
        self.store.api_keys.get(&id).map(|r| r.value().clone())
    }

    /// Overwrite `last_used_at` on a key
    pub fn set_api_key_last_used(&self, id: i64, at: Option<DateTime<Utc>>) {
        if let Some(mut key) = self.store.api_keys.get_mut(&id) {
            key.last_used_at = at;
        }
    }
}

/// In-memory user repository
#[derive(Clone)]
pub struct MemoryUserRepository(Arc<MemoryStore>);

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<UserRow>> {
        self.0.check_available()?;
        Ok(self.0.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        self.0.check_available()?;
        Ok(self
            .0
            .users
            .iter()
            .find(|r| r.email == email)
            .map(|r| r.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> DbResult<Option<UserRow>> {
        self.0.check_available()?;
        Ok(self
            .0
            .users
            .iter()
            .find(|r| r.username == username)
            .map(|r| r.value().clone()))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        self.0.check_available()?;
        let taken = self
            .0
            .users
            .iter()
            .any(|r| r.email == user.email || r.username == user.username);
        if taken {
            return Err(DbError::Conflict("user already exists".to_string()));
        }

        let now = Utc::now();
        let row = UserRow {
            id: self.0.next_id(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            is_active: true,
            is_admin: user.is_admin,
            daily_quota: user.daily_quota,
            created_at: now,
            updated_at: now,
        };
        self.0.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        self.0.check_available()?;
        let mut user = self.0.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.is_active = active;
        user.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory session repository
#[derive(Clone)]
pub struct MemorySessionRepository(Arc<MemoryStore>);

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn upsert(&self, session: UpsertSession) -> DbResult<SessionRow> {
        self.0.check_available()?;
        let row = SessionRow {
            id: self.0.next_id(),
            user_id: session.user_id,
            token: session.token,
            created_at: Utc::now(),
            expires_at: session.expires_at,
        };

        // The entry holds the shard lock, so concurrent upserts for one user serialize
        match self.0.sessions.entry(session.user_id) {
            Entry::Occupied(mut existing) => {
                existing.insert(row.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(row.clone());
            }
        }
        Ok(row)
    }

    async fn find_live_by_token(&self, token: &str) -> DbResult<Option<SessionWithUser>> {
        self.0.check_available()?;
        let now = Utc::now();
        let session = self
            .0
            .sessions
            .iter()
            .find(|r| r.token == token && r.is_live_at(now))
            .map(|r| r.value().clone());

        Ok(session.and_then(|session| {
            self.0
                .users
                .get(&session.user_id)
                .map(|user| SessionWithUser {
                    user: user.value().clone(),
                    session,
                })
        }))
    }

    async fn find_live_by_user_id(&self, user_id: i64) -> DbResult<Vec<SessionRow>> {
        self.0.check_available()?;
        let now = Utc::now();
        Ok(self
            .0
            .sessions
            .get(&user_id)
            .filter(|r| r.is_live_at(now))
            .map(|r| r.value().clone())
            .into_iter()
            .collect())
    }

    async fn delete_by_token(&self, token: &str) -> DbResult<u64> {
        self.0.check_available()?;
        let before = self.0.sessions.len();
        self.0.sessions.retain(|_, s| s.token != token);
        Ok(before.saturating_sub(self.0.sessions.len()) as u64)
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        self.0.check_available()?;
        let now = Utc::now();
        let before = self.0.sessions.len();
        self.0.sessions.retain(|_, s| s.is_live_at(now));
        Ok(before.saturating_sub(self.0.sessions.len()) as u64)
    }
}

/// In-memory API key repository
#[derive(Clone)]
pub struct MemoryApiKeyRepository(Arc<MemoryStore>);

#[async_trait]
impl ApiKeyRepository for MemoryApiKeyRepository {
    async fn find_by_key(&self, key: &str) -> DbResult<Option<ApiKeyRow>> {
        self.0.check_available()?;
        Ok(self
            .0
            .api_keys
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value().clone()))
    }

    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Vec<ApiKeyRow>> {
        self.0.check_available()?;
        let mut rows: Vec<ApiKeyRow> = self
            .0
            .api_keys
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn find_active_used_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<ApiKeyRow>> {
        self.0.check_available()?;
        let mut rows: Vec<ApiKeyRow> = self
            .0
            .api_keys
            .iter()
            .filter(|r| {
                r.user_id == user_id
                    && r.is_active()
                    && r.last_used_at.is_some_and(|used| used >= since)
            })
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.last_used_at);
        Ok(rows)
    }

    async fn create(&self, key: CreateApiKey) -> DbResult<ApiKeyRow> {
        self.0.check_available()?;
        if self.0.api_keys.iter().any(|r| r.key == key.key) {
            return Err(DbError::Conflict("api key already exists".to_string()));
        }

        let row = ApiKeyRow {
            id: self.0.next_id(),
            user_id: key.user_id,
            key: key.key,
            secret_digest: key.secret_digest,
            status: "active".to_string(),
            usage_count: 0,
            last_used_at: None,
            created_at: Utc::now(),
        };
        self.0.api_keys.insert(row.id, row.clone());
        Ok(row)
    }

    async fn record_usage(&self, id: i64) -> DbResult<()> {
        self.0.check_available()?;
        let mut key = self.0.api_keys.get_mut(&id).ok_or(DbError::NotFound)?;
        let now = Utc::now();
        key.usage_count += 1;
        key.last_used_at = Some(key.last_used_at.map_or(now, |prev| prev.max(now)));
        Ok(())
    }

    async fn set_status(&self, user_id: i64, id: i64, status: &str) -> DbResult<u64> {
        self.0.check_available()?;
        match self.0.api_keys.get_mut(&id) {
            Some(mut key) if key.user_id == user_id => {
                key.status = status.to_string();
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
