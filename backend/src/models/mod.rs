//! Data models shared across database access and API handlers.

use serde::{Deserialize, Serialize};

pub mod account;
pub mod audit_log;
pub mod cookie_session;
pub mod refresh_session;
pub mod user;

/// Body returned by endpoints that only acknowledge success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Body carrying a freshly minted access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
