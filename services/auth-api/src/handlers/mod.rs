//! HTTP handlers

mod api_keys;
mod auth;
mod health;

pub use api_keys::{create_api_key, list_api_keys, revoke_api_key, usage_stats};
pub use auth::{login, logout, me, signup};
pub use health::{health, ready};
