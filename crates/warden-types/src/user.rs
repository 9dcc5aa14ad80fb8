//! User types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ParseError, UserId};

/// Dashboard role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular dashboard member
    #[default]
    Member,
    /// Maintainer with write access to managed resources
    Maintainer,
    /// Full administrative access
    Admin,
}

impl Role {
    /// Role name as stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Maintainer => "maintainer",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" | "user" => Ok(Self::Member),
            "maintainer" => Ok(Self::Maintainer),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseError::InvalidRole(s.to_string())),
        }
    }
}

/// Public profile of a user, safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID
    pub id: UserId,
    /// Email address
    pub email: String,
    /// Unique username
    pub username: String,
    /// Dashboard role
    pub role: Role,
    /// Whether the account may sign in
    pub is_active: bool,
    /// Administrator flag
    pub is_admin: bool,
    /// Requests allowed per day
    pub daily_quota: i32,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}
