//! Auth service - ties together passwords, tokens, sessions and API keys

use chrono::{DateTime, Utc};
use std::sync::Arc;
use warden_db::{ApiKeyRepository, CreateUser, SessionRepository, UserRepository, UserRow};
use warden_types::{ApiKeyId, ApiKeySummary, Role, UsagePoint, UserId, UserProfile};

use crate::{
    api_key::{ApiKeyService, GeneratedApiKey},
    config::AuthConfig,
    password::PasswordHasher,
    profile::profile_from_row,
    resolver::{CredentialResolver, Resolution, ResolvedCredential},
    session::SessionManager,
    token::TokenIssuer,
    AuthError,
};

/// Quota granted to new accounts
const DEFAULT_DAILY_QUOTA: i32 = 1000;

/// Shortest password accepted at signup
const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: UserProfile,
}

/// New account fields
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl SignupRequest {
    fn validate(&self) -> Result<(), AuthError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput("email is not valid".to_string()));
        }
        let username = self.username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidInput("username is required".to_string()));
        }
        // Login treats any identifier with '@' as an email
        if username.contains('@') {
            return Err(AuthError::InvalidInput(
                "username must not contain '@'".to_string(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Authentication service
///
/// Provides one interface for:
/// - account creation and password login
/// - session issuance and logout
/// - API key management
/// - bearer credential resolution
pub struct AuthService<U, S, K>
where
    U: UserRepository,
    S: SessionRepository,
    K: ApiKeyRepository,
{
    config: AuthConfig,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    sessions: SessionManager<S>,
    api_keys: ApiKeyService<K, U>,
    resolver: CredentialResolver<U, S, K>,
    users: Arc<U>,
}

impl<U, S, K> AuthService<U, S, K>
where
    U: UserRepository,
    S: SessionRepository,
    K: ApiKeyRepository,
{
    /// Create a new auth service.
    ///
    /// Fails with `Configuration` when the signing secret or hash cost is
    /// unusable.
    pub fn new(
        config: AuthConfig,
        users: Arc<U>,
        session_repo: Arc<S>,
        api_key_repo: Arc<K>,
    ) -> Result<Self, AuthError> {
        let issuer = TokenIssuer::from_config(&config)?;
        Self::with_issuer(config, issuer, users, session_repo, api_key_repo)
    }

    /// Create a service around an explicit issuer
    pub fn with_issuer(
        config: AuthConfig,
        issuer: TokenIssuer,
        users: Arc<U>,
        session_repo: Arc<S>,
        api_key_repo: Arc<K>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(config.hash_cost)?;
        let sessions = SessionManager::new(session_repo);
        let api_keys = ApiKeyService::new(issuer.clone(), api_key_repo, Arc::clone(&users));

        let mut resolver = CredentialResolver::new(api_keys.clone(), issuer.clone());
        if config.require_live_session {
            resolver = resolver.with_live_sessions(sessions.clone());
        }

        Ok(Self {
            config,
            hasher,
            issuer,
            sessions,
            api_keys,
            resolver,
            users,
        })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an account with a password
    pub async fn signup(&self, request: SignupRequest) -> Result<UserProfile, AuthError> {
        request.validate()?;
        let password_hash = self.hasher.hash_async(request.password).await?;

        let user = self
            .users
            .create(CreateUser {
                email: request.email.trim().to_lowercase(),
                username: request.username.trim().to_string(),
                password_hash: Some(password_hash),
                role: Role::Member.as_str().to_string(),
                is_admin: false,
                daily_quota: DEFAULT_DAILY_QUOTA,
            })
            .await?;

        tracing::info!(user_id = user.id, "User signed up");
        Ok(profile_from_row(&user))
    }

    /// Password login by email or username
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let identifier = identifier.trim();
        let found = if identifier.contains('@') {
            self.users.find_by_email(&identifier.to_lowercase()).await?
        } else {
            self.users.find_by_username(identifier).await?
        };

        // One full verification on every path; a missing digest verifies
        // against a placeholder
        let digest = found
            .as_ref()
            .filter(|user| user.is_active)
            .and_then(|user| user.password_hash.clone());
        let verified = self
            .hasher
            .verify_stored_async(password.to_string(), digest)
            .await;

        let Some(user) = found else {
            tracing::debug!("Login rejected: unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };
        if !user.is_active {
            tracing::debug!(user_id = user.id, "Login rejected: inactive user");
            return Err(AuthError::InvalidCredentials);
        }
        if user.password_hash.is_none() {
            tracing::debug!(user_id = user.id, "Login rejected: no password set");
            return Err(AuthError::InvalidCredentials);
        }
        if !verified {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(&user).await
    }

    /// Login for an identity proven elsewhere; creates it on first sight
    pub async fn login_external(
        &self,
        email: &str,
        username: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let email = email.trim().to_lowercase();
        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                let user = self
                    .users
                    .create(CreateUser {
                        email,
                        username: username.trim().to_string(),
                        password_hash: None,
                        role: Role::Member.as_str().to_string(),
                        is_admin: false,
                        daily_quota: DEFAULT_DAILY_QUOTA,
                    })
                    .await?;
                tracing::info!(user_id = user.id, "External identity created");
                user
            }
        };

        if !user.is_active {
            tracing::debug!(user_id = user.id, "External login rejected: inactive user");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(&user).await
    }

    async fn issue_session(&self, user: &UserRow) -> Result<LoginOutcome, AuthError> {
        let user_id = UserId(user.id);
        let (token, claims) = self
            .issuer
            .sign_session(user_id, &user.email, user.is_admin)?;
        let expires_at = claims.expires_at();

        self.sessions
            .create_session(user_id, token.clone(), expires_at)
            .await?;

        tracing::info!(user_id = %user_id, "Session issued");
        Ok(LoginOutcome {
            token,
            expires_at,
            profile: profile_from_row(user),
        })
    }

    /// End the session holding `token`
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete_session(token).await
    }

    // =========================================================================
    // Credential Resolution
    // =========================================================================

    /// Resolve a bearer string without loading the user
    pub async fn resolve(&self, bearer: Option<&str>) -> Resolution {
        self.resolver.resolve(bearer).await
    }

    /// Resolve a bearer string and load its owner's profile
    pub async fn authenticate(
        &self,
        bearer: Option<&str>,
    ) -> Result<(ResolvedCredential, UserProfile), AuthError> {
        let credential = self.resolve(bearer).await.into_result()?;
        let raw = bearer.map(str::trim).unwrap_or_default();
        let profile = self.api_keys.get_user_from_token(&credential, raw).await?;
        Ok((credential, profile))
    }

    // =========================================================================
    // API Keys
    // =========================================================================

    /// Mint an API key
    pub async fn generate_api_key(&self, user_id: UserId) -> Result<GeneratedApiKey, AuthError> {
        self.api_keys.generate_api_key(user_id).await
    }

    /// A user's keys
    pub async fn list_api_keys(&self, user_id: UserId) -> Result<Vec<ApiKeySummary>, AuthError> {
        self.api_keys.list_api_keys(user_id).await
    }

    /// Revoke one of a user's keys
    pub async fn revoke_api_key(&self, user_id: UserId, key_id: ApiKeyId) -> Result<(), AuthError> {
        self.api_keys.revoke_api_key(user_id, key_id).await
    }

    /// Usage series for a user's active keys
    pub async fn api_key_usage_stats(&self, user_id: UserId) -> Result<Vec<UsagePoint>, AuthError> {
        self.api_keys.get_api_key_usage_stats(user_id).await
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Get the session manager
    pub fn sessions(&self) -> &SessionManager<S> {
        &self.sessions
    }

    /// Get the API key service
    pub fn api_keys(&self) -> &ApiKeyService<K, U> {
        &self.api_keys
    }

    /// Get the token issuer
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Get the password hasher
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }
}

impl<U, S, K> std::fmt::Debug for AuthService<U, S, K>
where
    U: UserRepository,
    S: SessionRepository,
    K: ApiKeyRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
