//! Stored refresh grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{RefreshSessionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
/// One outstanding refresh grant, looked up by its opaque token.
pub struct RefreshSession {
    pub id: RefreshSessionId,
    pub user_id: UserId,
    /// Hex-encoded random token handed to the client.
    pub token: String,
    /// Absolute expiry; the grant is useless afterwards.
    pub expires_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Refresh grant about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefreshSession {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
