use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::UserId;

/// Security-relevant event kinds recorded by the audit sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    SignUp,
    SignIn,
    TokenRefresh,
    LogIn,
    LogOut,
    AccountCreate,
    AccountUpdate,
    AccountDelete,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::SignUp => "sign_up",
            AuditEventType::SignIn => "sign_in",
            AuditEventType::TokenRefresh => "token_refresh",
            AuditEventType::LogIn => "log_in",
            AuditEventType::LogOut => "log_out",
            AuditEventType::AccountCreate => "account_create",
            AuditEventType::AccountUpdate => "account_update",
            AuditEventType::AccountDelete => "account_delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Failure,
}

impl AuditResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Success => "success",
            AuditResult::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<UserId>,
    pub event_type: AuditEventType,
    pub result: AuditResult,
    pub target_id: Option<String>,
    pub request_id: Option<String>,
}

impl AuditEvent {
    pub fn success(event_type: AuditEventType, actor_id: Option<UserId>) -> Self {
        Self {
            occurred_at: Utc::now(),
            actor_id,
            event_type,
            result: AuditResult::Success,
            target_id: None,
            request_id: None,
        }
    }

    pub fn failure(event_type: AuditEventType, actor_id: Option<UserId>) -> Self {
        Self {
            result: AuditResult::Failure,
            ..Self::success(event_type, actor_id)
        }
    }

    pub fn with_target(mut self, target_id: impl ToString) -> Self {
        self.target_id = Some(target_id.to_string());
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Row stored in `audit_logs`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: String,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<UserId>,
    pub event_type: String,
    pub result: String,
    pub target_id: Option<String>,
    pub request_id: Option<String>,
}
