//! In-process stores used when no `DATABASE_URL` is configured and by tests.
//!
//! Each store keeps its state behind one `tokio::sync::Mutex`, so every
//! operation is atomic with respect to the others on the same store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{
    AccountRepository, CookieSessionRepository, RefreshSessionRepository, Replacement, Rotation,
    UserRepository,
};
use crate::error::StoreError;
use crate::models::account::{Account, CreateAccount, UpdateAccount};
use crate::models::cookie_session::CookieSession;
use crate::models::refresh_session::{NewRefreshSession, RefreshSession};
use crate::models::user::{NewUser, User};
use crate::types::{AccountId, RefreshSessionId, UserId};

#[derive(Debug)]
struct Table<T> {
    last_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Table<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(
        &self,
        user: NewUser,
        registered_at: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let mut table = self.users.lock().await;
        if table.rows.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict);
        }
        let id = table.next_id();
        let user = User {
            id: UserId::new(id),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            registered_at,
        };
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.users.lock().await;
        Ok(table.rows.values().find(|user| user.email == email).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRefreshSessionRepository {
    sessions: Mutex<RefreshTable>,
}

#[derive(Debug, Default)]
struct RefreshTable {
    last_id: i64,
    by_token: HashMap<String, RefreshSession>,
}

impl RefreshTable {
    fn insert(&mut self, session: NewRefreshSession) -> Result<RefreshSession, StoreError> {
        if self.by_token.contains_key(&session.token) {
            return Err(StoreError::Conflict);
        }
        self.last_id += 1;
        let stored = RefreshSession {
            id: RefreshSessionId::new(self.last_id),
            user_id: session.user_id,
            token: session.token,
            expires_at: session.expires_at,
        };
        self.by_token.insert(stored.token.clone(), stored.clone());
        Ok(stored)
    }
}

impl InMemoryRefreshSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.by_token.len()
    }
}

#[async_trait]
impl RefreshSessionRepository for InMemoryRefreshSessionRepository {
    async fn create(&self, session: NewRefreshSession) -> Result<RefreshSession, StoreError> {
        self.sessions.lock().await.insert(session)
    }

    async fn rotate(
        &self,
        token: &str,
        replacement: Replacement,
        now: DateTime<Utc>,
    ) -> Result<Rotation, StoreError> {
        let mut table = self.sessions.lock().await;
        let Some(previous) = table.by_token.remove(token) else {
            return Ok(Rotation::Missing);
        };
        if previous.is_expired(now) {
            return Ok(Rotation::Expired(previous));
        }
        let next = match table.insert(NewRefreshSession {
            user_id: previous.user_id,
            token: replacement.token,
            expires_at: replacement.expires_at,
        }) {
            Ok(next) => next,
            Err(err) => {
                // Put the consumed grant back so a failed rotation changes nothing.
                table.by_token.insert(previous.token.clone(), previous);
                return Err(err);
            }
        };
        Ok(Rotation::Rotated { previous, next })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut table = self.sessions.lock().await;
        let before = table.by_token.len();
        table.by_token.retain(|_, session| !session.is_expired(now));
        Ok((before - table.by_token.len()) as u64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCookieSessionRepository {
    sessions: Mutex<HashMap<String, CookieSession>>,
}

impl InMemoryCookieSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CookieSessionRepository for InMemoryCookieSessionRepository {
    async fn create(&self, session: CookieSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Conflict);
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<CookieSession>, StoreError> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.lock().await.remove(id).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<Table<Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(
        &self,
        owner: UserId,
        input: CreateAccount,
        now: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let mut table = self.accounts.lock().await;
        let id = table.next_id();
        let account = Account {
            id: AccountId::new(id),
            user_id: owner,
            balance: input.balance,
            currency: input.currency,
            last_update: now,
        };
        table.rows.insert(id, account.clone());
        Ok(account)
    }

    async fn get_by_id(&self, owner: UserId, id: AccountId) -> Result<Account, StoreError> {
        let table = self.accounts.lock().await;
        table
            .rows
            .get(&id.get())
            .filter(|account| account.user_id == owner)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, owner: UserId) -> Result<Vec<Account>, StoreError> {
        let table = self.accounts.lock().await;
        Ok(table
            .rows
            .values()
            .filter(|account| account.user_id == owner)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        owner: UserId,
        id: AccountId,
        input: UpdateAccount,
        now: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let mut table = self.accounts.lock().await;
        let account = table
            .rows
            .get_mut(&id.get())
            .filter(|account| account.user_id == owner)
            .ok_or(StoreError::NotFound)?;
        if let Some(balance) = input.balance {
            account.balance = balance;
        }
        if let Some(currency) = input.currency {
            account.currency = currency;
        }
        account.last_update = now;
        Ok(account.clone())
    }

    async fn delete(&self, owner: UserId, id: AccountId) -> Result<(), StoreError> {
        let mut table = self.accounts.lock().await;
        let owned = table
            .rows
            .get(&id.get())
            .is_some_and(|account| account.user_id == owner);
        if !owned {
            return Err(StoreError::NotFound);
        }
        table.rows.remove(&id.get());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    fn replacement(token: &str, now: DateTime<Utc>) -> Replacement {
        Replacement {
            token: token.into(),
            expires_at: now + Duration::days(1),
        }
    }

    #[tokio::test]
    async fn user_email_is_unique() {
        let repo = InMemoryUserRepository::new();
        let first = repo.create(new_user("a@x.com"), Utc::now()).await.unwrap();
        assert_eq!(first.id, UserId::new(1));
        assert!(matches!(
            repo.create(new_user("a@x.com"), Utc::now()).await,
            Err(StoreError::Conflict)
        ));
        let found = repo.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(repo.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rotate_consumes_the_grant_once() {
        let repo = InMemoryRefreshSessionRepository::new();
        let now = Utc::now();
        repo.create(NewRefreshSession {
            user_id: UserId::new(7),
            token: "old".into(),
            expires_at: now + Duration::days(1),
        })
        .await
        .unwrap();

        let rotation = repo.rotate("old", replacement("new", now), now).await.unwrap();
        let Rotation::Rotated { previous, next } = rotation else {
            panic!("expected rotation, got {:?}", rotation);
        };
        assert_eq!(previous.token, "old");
        assert_eq!(next.token, "new");
        assert_eq!(next.user_id, UserId::new(7));

        assert_eq!(
            repo.rotate("old", replacement("newer", now), now).await.unwrap(),
            Rotation::Missing
        );
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn rotate_reports_expired_grant_without_issuing() {
        let repo = InMemoryRefreshSessionRepository::new();
        let now = Utc::now();
        repo.create(NewRefreshSession {
            user_id: UserId::new(7),
            token: "old".into(),
            expires_at: now - Duration::seconds(1),
        })
        .await
        .unwrap();

        let rotation = repo.rotate("old", replacement("new", now), now).await.unwrap();
        assert!(matches!(rotation, Rotation::Expired(_)));
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn delete_expired_keeps_live_sessions() {
        let repo = InMemoryCookieSessionRepository::new();
        let now = Utc::now();
        for (id, expires_at) in [("live", now + Duration::hours(1)), ("dead", now)] {
            repo.create(CookieSession {
                id: id.into(),
                user_id: UserId::new(1),
                created_at: now,
                expires_at,
            })
            .await
            .unwrap();
        }
        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert!(repo.find("live").await.unwrap().is_some());
        assert!(repo.find("dead").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn accounts_are_scoped_to_their_owner() {
        let repo = InMemoryAccountRepository::new();
        let alice = UserId::new(1);
        let bob = UserId::new(2);
        let account = repo
            .create(
                alice,
                CreateAccount {
                    balance: 100,
                    currency: "UAH".into(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(repo.list(bob).await.unwrap().is_empty());
        assert!(matches!(
            repo.get_by_id(bob, account.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            repo.delete(bob, account.id).await,
            Err(StoreError::NotFound)
        ));

        let updated = repo
            .update(
                alice,
                account.id,
                UpdateAccount {
                    balance: Some(250),
                    currency: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(updated.balance, 250);
        assert_eq!(updated.currency, "UAH");

        repo.delete(alice, account.id).await.unwrap();
        assert!(repo.list(alice).await.unwrap().is_empty());
    }
}
