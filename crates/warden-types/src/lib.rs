//! Warden Types - Shared domain types
//!
//! This crate contains domain types used across Warden crates:
//! - Numeric identifiers (serialized as strings at the wire boundary)
//! - User profile and role
//! - API key status and usage series

pub mod api_key;
pub mod credential;
pub mod error;
pub mod id;
pub mod user;

pub use api_key::*;
pub use credential::*;
pub use error::*;
pub use id::*;
pub use user::*;
