use std::sync::Arc;

use crate::{
    error::AccountError,
    models::account::{Account, CreateAccount, UpdateAccount},
    repositories::AccountRepository,
    types::{AccountId, UserId},
    utils::Clock,
};

use super::account_cache::AccountCache;

/// Owner-scoped account operations with a read-through cache in front of
/// the repository. `owner` always comes from the resolved caller.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    cache: AccountCache,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        cache: AccountCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            cache,
            clock,
        }
    }

    pub async fn create(
        &self,
        owner: UserId,
        input: CreateAccount,
    ) -> Result<Account, AccountError> {
        let account = self.accounts.create(owner, input, self.clock.now()).await?;
        self.cache.invalidate(owner, None);
        Ok(account)
    }

    pub async fn get_by_id(&self, owner: UserId, id: AccountId) -> Result<Account, AccountError> {
        if let Some(account) = self.cache.get(owner, id) {
            tracing::debug!(%owner, %id, "account cache hit");
            return Ok(account);
        }
        let generation = self.cache.generation();
        let account = self.accounts.get_by_id(owner, id).await?;
        self.cache.put(&account, generation);
        Ok(account)
    }

    pub async fn list(&self, owner: UserId) -> Result<Vec<Account>, AccountError> {
        if let Some(accounts) = self.cache.get_list(owner) {
            tracing::debug!(%owner, "account list cache hit");
            return Ok(accounts);
        }
        let generation = self.cache.generation();
        let accounts = self.accounts.list(owner).await?;
        self.cache.put_list(owner, &accounts, generation);
        Ok(accounts)
    }

    pub async fn update(
        &self,
        owner: UserId,
        id: AccountId,
        input: UpdateAccount,
    ) -> Result<Account, AccountError> {
        if input.is_empty() {
            return Err(AccountError::EmptyUpdate);
        }
        let account = self
            .accounts
            .update(owner, id, input, self.clock.now())
            .await?;
        // Writers only invalidate; the next read repopulates from storage.
        self.cache.invalidate(owner, Some(id));
        Ok(account)
    }

    pub async fn delete(&self, owner: UserId, id: AccountId) -> Result<(), AccountError> {
        self.accounts.delete(owner, id).await?;
        self.cache.invalidate(owner, Some(id));
        Ok(())
    }
}
