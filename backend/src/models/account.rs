//! Monetary accounts owned by a single user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::types::{AccountId, UserId};
use crate::validation::rules::validate_currency;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
/// Database representation of an account.
pub struct Account {
    pub id: AccountId,
    /// Owner resolved by the authorization middleware at creation time.
    pub user_id: UserId,
    /// Balance in minor currency units.
    pub balance: i64,
    /// ISO 4217 code, upper case.
    pub currency: String,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
/// Payload for opening an account. The owner is never taken from the body.
pub struct CreateAccount {
    #[serde(default)]
    pub balance: i64,
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
/// Partial update; absent fields keep their stored value.
pub struct UpdateAccount {
    pub balance: Option<i64>,
    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,
}

impl UpdateAccount {
    pub fn is_empty(&self) -> bool {
        self.balance.is_none() && self.currency.is_none()
    }
}
