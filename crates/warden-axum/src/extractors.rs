//! Axum extractors for authentication and authorization.
//!
//! These read the [`AuthContext`] the request gate attached to the request.
//!
//! # Usage
//!
//! ```ignore
//! use warden_axum::{MaybeAuth, RequireAdmin, RequireAuth};
//!
//! // 401 if the gate did not authenticate the request
//! async fn protected(auth: RequireAuth) -> String {
//!     format!("Hello, {}!", auth.profile.username)
//! }
//!
//! // 403 unless the caller is an administrator
//! async fn admin_only(auth: RequireAdmin) -> String {
//!     format!("Welcome back, {}", auth.profile.username)
//! }
//!
//! // Never rejects; useful on exempt routes
//! async fn landing(auth: MaybeAuth) -> String {
//!     match auth.0 {
//!         Some(ctx) => format!("Hello, {}!", ctx.profile.username),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::context::AuthContext;
use crate::error::AccessError;

/// Extractor that requires authentication.
///
/// Returns 401 Unauthorized if no valid authentication is present.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AccessError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Self)
            .ok_or(AccessError::Unauthorized)
    }
}

/// Extractor for optional authentication.
///
/// Returns `None` if no authentication is present, rather than failing.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl Deref for MaybeAuth {
    type Target = Option<AuthContext>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthContext>().cloned()))
    }
}

/// Extractor that requires an administrator.
///
/// Returns 401 if unauthenticated, 403 if not an admin.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthContext);

impl Deref for RequireAdmin {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AccessError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(context) = RequireAuth::from_request_parts(parts, state).await?;

        if !context.is_admin() {
            return Err(AccessError::Forbidden("admin role required".to_string()));
        }

        Ok(Self(context))
    }
}
