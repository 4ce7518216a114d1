//! In-memory synchronisation store for account data.
//!
//! The store keeps one entry per [`AccountCacheKey`] and walks each entry
//! through `Fresh → Stale → Refetching → Fresh`. Reads of a stale or missing
//! entry fetch through the supplied closure; concurrent readers of the same
//! key share a single in-flight fetch. Writes replace values wholesale with
//! server-returned records, so no field is ever patched locally.
//!
//! The store is an explicit object handed to callers. Clone it to share one
//! session's state; drop the last clone to end the session.

mod entry;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::TimeDelta;
use futures_util::FutureExt;
use mockable::{Clock, DefaultClock};
use tokio::sync::broadcast;
use tracing::debug;

pub use self::entry::{CacheEvent, EntryState};
use self::entry::{Entry, Phase, SharedFetch, Stored, StoredValue};
use crate::domain::ports::{AccountCacheKey, AccountGatewayError};
use crate::domain::{Account, AccountId};

/// Default age after which a fresh entry is treated as stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Keyed store of account lists and account records.
#[derive(Clone)]
pub struct AccountStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    entries: Mutex<HashMap<AccountCacheKey, Entry>>,
    clock: Arc<dyn Clock + Send + Sync>,
    stale_after: TimeDelta,
    events: broadcast::Sender<CacheEvent>,
}

enum ReadPlan {
    Hit(StoredValue),
    Await { fetch: SharedFetch, generation: u64 },
}

impl AccountStore {
    /// Build a store reading time from `clock`.
    ///
    /// Fresh entries older than `stale_after` are refetched on the next read.
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, stale_after: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                entries: Mutex::new(HashMap::new()),
                clock,
                stale_after: TimeDelta::from_std(stale_after).unwrap_or(TimeDelta::MAX),
                events,
            }),
        }
    }

    /// Read the account list, fetching when the entry is missing or stale.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the entry stays stale.
    pub async fn read_list<F, Fut>(&self, fetch: F) -> Result<Vec<Account>, AccountGatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Account>, AccountGatewayError>> + Send + 'static,
    {
        self.read_through(AccountCacheKey::List, fetch).await
    }

    /// Read one account, fetching when the entry is missing or stale.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the entry stays stale.
    pub async fn read_account<F, Fut>(
        &self,
        id: &AccountId,
        fetch: F,
    ) -> Result<Account, AccountGatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Account, AccountGatewayError>> + Send + 'static,
    {
        self.read_through(AccountCacheKey::detail(id), fetch).await
    }

    /// Replace an account's detail entry with a server-returned record.
    pub fn write_account(&self, account: Account) {
        let key = AccountCacheKey::detail(account.account_id());
        self.write(key, account);
    }

    /// Replace the list entry with a server-returned list.
    pub fn write_list(&self, accounts: Vec<Account>) {
        self.write(AccountCacheKey::List, accounts);
    }

    /// Mark an entry stale so the next read fetches again.
    ///
    /// Invalidating the list before it was ever read records a stale
    /// placeholder so its state is observable. An uncached detail entry is
    /// left absent; its next read fetches anyway. An in-flight fetch for the
    /// key still answers its waiting readers but its result is not kept.
    pub fn invalidate(&self, key: &AccountCacheKey) {
        {
            let mut entries = self.entries();
            match entries.get_mut(key) {
                Some(entry) => entry.mark_stale(),
                None if key.is_list() => {
                    entries.insert(key.clone(), Entry::empty());
                }
                None => {
                    debug!(%key, "uncached entry needs no invalidation");
                    return;
                }
            }
        }
        debug!(%key, "cache entry invalidated");
        self.publish(key.clone(), EntryState::Stale);
    }

    /// Cached list without fetching, regardless of freshness.
    #[must_use]
    pub fn peek_list(&self) -> Option<Vec<Account>> {
        self.peek(&AccountCacheKey::List)
    }

    /// Cached account without fetching, regardless of freshness.
    #[must_use]
    pub fn peek_account(&self, id: &AccountId) -> Option<Account> {
        self.peek(&AccountCacheKey::detail(id))
    }

    /// Current state of an entry, or `None` if the key is not cached.
    ///
    /// `Refetching` means a fetch was started and has not completed. When
    /// every reader awaiting it is dropped the fetch is parked, not
    /// abandoned: the entry keeps reporting `Refetching` and the next read
    /// resumes that fetch instead of starting another.
    #[must_use]
    pub fn state(&self, key: &AccountCacheKey) -> Option<EntryState> {
        let now = self.inner.clock.utc();
        self.entries()
            .get(key)
            .map(|entry| entry.state(now, self.inner.stale_after))
    }

    /// Subscribe to entry state changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    /// Drop every entry.
    ///
    /// Subscribers receive a `Stale` event for each dropped key. In-flight
    /// fetches still answer their waiting readers; their results are
    /// discarded.
    pub fn clear(&self) {
        let mut dropped: Vec<AccountCacheKey> =
            self.entries().drain().map(|(key, _)| key).collect();
        dropped.sort();
        debug!(count = dropped.len(), "account store cleared");
        for key in dropped {
            self.publish(key, EntryState::Stale);
        }
    }

    async fn read_through<V, F, Fut>(
        &self,
        key: AccountCacheKey,
        fetch: F,
    ) -> Result<V, AccountGatewayError>
    where
        V: Stored,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AccountGatewayError>> + Send + 'static,
    {
        let (fetch, generation) = match self.plan_read(&key, fetch) {
            ReadPlan::Hit(value) => return Self::typed(&key, &value),
            ReadPlan::Await { fetch, generation } => (fetch, generation),
        };

        let result = fetch.await;
        self.complete(&key, generation, &result);
        result.and_then(|value| Self::typed(&key, &value))
    }

    fn plan_read<V, F, Fut>(&self, key: &AccountCacheKey, fetch: F) -> ReadPlan
    where
        V: Stored,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AccountGatewayError>> + Send + 'static,
    {
        let now = self.inner.clock.utc();
        let mut entries = self.entries();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);

        match &entry.phase {
            Phase::Fresh if !entry.is_expired(now, self.inner.stale_after) => {
                if let Some(value) = entry.value.clone() {
                    return ReadPlan::Hit(value);
                }
            }
            Phase::Refetching(in_flight) => {
                debug!(%key, "joining in-flight fetch");
                return ReadPlan::Await {
                    fetch: in_flight.clone(),
                    generation: entry.generation,
                };
            }
            Phase::Fresh | Phase::Stale => {}
        }

        let shared = fetch()
            .map(|result| result.map(Stored::into_stored))
            .boxed()
            .shared();
        entry.phase = Phase::Refetching(shared.clone());
        let generation = entry.generation;
        drop(entries);

        debug!(%key, "fetching cache entry");
        self.publish(key.clone(), EntryState::Refetching);
        ReadPlan::Await {
            fetch: shared,
            generation,
        }
    }

    /// Record a finished fetch unless the entry moved on while it ran.
    fn complete(
        &self,
        key: &AccountCacheKey,
        generation: u64,
        result: &Result<StoredValue, AccountGatewayError>,
    ) {
        let now = self.inner.clock.utc();
        let state = {
            let mut entries = self.entries();
            let Some(entry) = entries.get_mut(key) else {
                debug!(%key, "discarding fetch result for cleared entry");
                return;
            };
            if entry.generation != generation || !matches!(entry.phase, Phase::Refetching(_)) {
                debug!(%key, "discarding fetch result superseded by a newer write");
                return;
            }
            match result {
                Ok(value) => {
                    entry.store(value.clone(), now);
                    EntryState::Fresh
                }
                Err(error) => {
                    debug!(%key, %error, "fetch failed; entry stays stale");
                    entry.mark_stale();
                    EntryState::Stale
                }
            }
        };
        self.publish(key.clone(), state);
    }

    fn write<V: Stored>(&self, key: AccountCacheKey, value: V) {
        let now = self.inner.clock.utc();
        self.entries()
            .entry(key.clone())
            .or_insert_with(Entry::empty)
            .store(value.into_stored(), now);
        debug!(%key, "cache entry replaced");
        self.publish(key, EntryState::Fresh);
    }

    fn peek<V: Stored>(&self, key: &AccountCacheKey) -> Option<V> {
        self.entries()
            .get(key)
            .and_then(|entry| entry.value.as_ref())
            .and_then(V::from_stored)
    }

    fn typed<V: Stored>(key: &AccountCacheKey, value: &StoredValue) -> Result<V, AccountGatewayError> {
        V::from_stored(value).ok_or_else(|| {
            AccountGatewayError::decode(format!("cached value for {key} has an unexpected shape"))
        })
    }

    fn publish(&self, key: AccountCacheKey, state: EntryState) {
        if let Err(unobserved) = self.inner.events.send(CacheEvent { key, state }) {
            // Nobody is subscribed.
            drop(unobserved);
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<AccountCacheKey, Entry>> {
        // Every mutation replaces whole fields, so a poisoned map is still
        // consistent.
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock), DEFAULT_STALE_AFTER)
    }
}
