//! Owner-scoped account persistence.
//!
//! Every query filters by `user_id`; an account owned by someone else is
//! indistinguishable from one that does not exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::account::{Account, CreateAccount, UpdateAccount};
use crate::types::{AccountId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(
        &self,
        owner: UserId,
        input: CreateAccount,
        now: DateTime<Utc>,
    ) -> Result<Account, StoreError>;

    /// Fails with `StoreError::NotFound` when the owner has no such account.
    async fn get_by_id(&self, owner: UserId, id: AccountId) -> Result<Account, StoreError>;

    async fn list(&self, owner: UserId) -> Result<Vec<Account>, StoreError>;

    async fn update(
        &self,
        owner: UserId,
        id: AccountId,
        input: UpdateAccount,
        now: DateTime<Utc>,
    ) -> Result<Account, StoreError>;

    async fn delete(&self, owner: UserId, id: AccountId) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(
        &self,
        owner: UserId,
        input: CreateAccount,
        now: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (user_id, balance, currency, last_update) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, balance, currency, last_update",
        )
        .bind(owner)
        .bind(input.balance)
        .bind(&input.currency)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }

    async fn get_by_id(&self, owner: UserId, id: AccountId) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            "SELECT id, user_id, balance, currency, last_update FROM accounts \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn list(&self, owner: UserId) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT id, user_id, balance, currency, last_update FROM accounts \
             WHERE user_id = $1 ORDER BY id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn update(
        &self,
        owner: UserId,
        id: AccountId,
        input: UpdateAccount,
        now: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            "UPDATE accounts \
             SET balance = COALESCE($1, balance), \
                 currency = COALESCE($2, currency), \
                 last_update = $3 \
             WHERE id = $4 AND user_id = $5 \
             RETURNING id, user_id, balance, currency, last_update",
        )
        .bind(input.balance)
        .bind(input.currency.as_deref())
        .bind(now)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, owner: UserId, id: AccountId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
