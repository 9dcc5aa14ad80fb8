//! Warden Axum Integration
//!
//! Request gate and extractors for putting Warden auth in front of an Axum
//! router.
//!
//! # Quick Start
//!
//! ```ignore
//! use warden_axum::{GateConfig, RequestGateLayer, RequireAuth};
//! use axum::{Router, routing::get};
//!
//! async fn me(auth: RequireAuth) -> String {
//!     format!("Hello, {}!", auth.profile.username)
//! }
//!
//! let app = Router::new()
//!     .route("/api/auth/me", get(me))
//!     .layer(RequestGateLayer::new(authenticator, GateConfig::default()));
//! ```
//!
//! # Extractors
//!
//! - [`RequireAuth`] - Requires an authenticated caller (401 if missing)
//! - [`MaybeAuth`] - Optional authentication (None on exempt paths)
//! - [`RequireAdmin`] - Requires an administrator (403 otherwise)

pub mod authenticator;
pub mod context;
pub mod error;
pub mod extractors;
pub mod gate;

pub use authenticator::{Authenticator, SharedAuthenticator};
pub use context::AuthContext;
pub use error::AccessError;
pub use extractors::{MaybeAuth, RequireAdmin, RequireAuth};
pub use gate::{bearer_token, GateConfig, PathPattern, RequestGate, RequestGateLayer};
