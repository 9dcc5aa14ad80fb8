//! Warden Auth Core - Authentication business logic
//!
//! Two credential formats share one authorization boundary:
//! - session tokens (HS256 JWTs minted at login, backed by a session row)
//! - API keys (long-lived signed envelopes around a random secret)
//!
//! The [`CredentialResolver`] reconciles both into a single identity.

pub mod api_key;
pub mod config;
pub mod crypto;
pub mod error;
pub mod password;
pub mod profile;
pub mod resolver;
pub mod service;
pub mod session;
pub mod token;

pub use api_key::{ApiKeyService, GeneratedApiKey, VerifiedApiKey};
pub use config::{AuthConfig, Environment, DEV_SIGNING_SECRET};
pub use crypto::{constant_time_eq, constant_time_str_eq, hash_token, random_secret_hex};
pub use error::AuthError;
pub use password::{HashCost, PasswordHasher};
pub use profile::profile_from_row;
pub use resolver::{CredentialResolver, Resolution, ResolvedCredential, UnresolvedReason};
pub use service::{AuthService, LoginOutcome, SignupRequest};
pub use session::{LiveSession, SessionManager};
pub use token::{ApiKeyClaims, SessionClaims, SigningKey, SigningKeyError, TokenIssuer};
