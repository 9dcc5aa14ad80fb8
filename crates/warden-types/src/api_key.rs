//! API key types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ApiKeyId, ParseError};

/// Lifecycle status of an API key. Keys are never deleted, only revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    #[default]
    Active,
    Revoked,
}

impl ApiKeyStatus {
    /// Status name as stored in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for ApiKeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiKeyStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "revoked" => Ok(Self::Revoked),
            _ => Err(ParseError::InvalidApiKeyStatus(s.to_string())),
        }
    }
}

/// API key list item (never includes the key itself)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeySummary {
    /// API key ID
    pub id: ApiKeyId,
    /// Current status
    pub status: ApiKeyStatus,
    /// Number of successful verifications
    pub usage_count: i64,
    /// When the key was last used
    pub last_used_at: Option<DateTime<Utc>>,
    /// When the key was created
    pub created_at: DateTime<Utc>,
}

/// One point of the per-key usage series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePoint {
    /// Last time the key was used
    pub date: DateTime<Utc>,
    /// Usage counter at that time
    pub usage: i64,
}
