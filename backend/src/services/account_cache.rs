//! Read-through cache for account lookups.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::{
    models::account::Account,
    types::{AccountId, UserId},
    utils::Clock,
};

/// Expired entries are swept once per this many inserts.
const SWEEP_EVERY_INSERTS: u64 = 256;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// Entries are keyed by owner, so one user's cached rows are never served
/// to another. A zero TTL disables caching.
///
/// Readers take a [`generation`](AccountCache::generation) before going to
/// the repository and hand it back to `put`/`put_list`; a value read across
/// an invalidation is not stored.
#[derive(Clone)]
pub struct AccountCache {
    accounts: Arc<DashMap<(UserId, AccountId), CacheEntry<Account>>>,
    lists: Arc<DashMap<UserId, CacheEntry<Vec<Account>>>>,
    generation: Arc<AtomicU64>,
    inserts: Arc<AtomicU64>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AccountCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            lists: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
            inserts: Arc::new(AtomicU64::new(0)),
            ttl,
            clock,
        }
    }

    fn enabled(&self) -> bool {
        self.ttl > Duration::zero()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn get(&self, owner: UserId, id: AccountId) -> Option<Account> {
        let now = self.clock.now();
        let entry = self.accounts.get(&(owner, id))?;
        if entry.expires_at <= now {
            drop(entry);
            self.accounts.remove(&(owner, id));
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, account: &Account, seen_generation: u64) {
        if !self.enabled() {
            return;
        }
        let key = (account.user_id, account.id);
        self.accounts.insert(
            key,
            CacheEntry {
                value: account.clone(),
                expires_at: self.clock.now() + self.ttl,
            },
        );
        // An invalidation either bumped the generation before this check, or
        // it removes the entry after its bump.
        if self.generation() != seen_generation {
            self.accounts.remove(&key);
        }
        self.note_insert();
    }

    pub fn get_list(&self, owner: UserId) -> Option<Vec<Account>> {
        let now = self.clock.now();
        let entry = self.lists.get(&owner)?;
        if entry.expires_at <= now {
            drop(entry);
            self.lists.remove(&owner);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put_list(&self, owner: UserId, accounts: &[Account], seen_generation: u64) {
        if !self.enabled() {
            return;
        }
        self.lists.insert(
            owner,
            CacheEntry {
                value: accounts.to_vec(),
                expires_at: self.clock.now() + self.ttl,
            },
        );
        if self.generation() != seen_generation {
            self.lists.remove(&owner);
        }
        self.note_insert();
    }

    /// Drops the single entry (if any) and the owner's list.
    pub fn invalidate(&self, owner: UserId, id: Option<AccountId>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = id {
            self.accounts.remove(&(owner, id));
        }
        self.lists.remove(&owner);
    }

    /// Removes every expired entry.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.accounts.retain(|_, entry| entry.expires_at > now);
        self.lists.retain(|_, entry| entry.expires_at > now);
    }

    fn note_insert(&self) {
        let inserts = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if inserts % SWEEP_EVERY_INSERTS == 0 {
            self.purge_expired();
        }
    }
}
