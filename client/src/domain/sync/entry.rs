//! Per-key entry bookkeeping for the account store.

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::{BoxFuture, Shared};

use crate::domain::Account;
use crate::domain::ports::{AccountCacheKey, AccountGatewayError};

/// Observable lifecycle of one cache entry.
///
/// `Fresh → Stale → Refetching → Fresh`. A failed refetch returns to `Stale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Holds the latest value known to match the server.
    Fresh,
    /// Possibly out of date; the next read fetches again.
    Stale,
    /// A fetch is in flight; concurrent readers share it. A fetch whose
    /// readers were all dropped stays here until the next read resumes it.
    Refetching,
}

/// Change notification published whenever an entry moves between states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    /// Entry that changed.
    pub key: AccountCacheKey,
    /// State after the change.
    pub state: EntryState,
}

#[derive(Debug, Clone)]
pub(super) enum StoredValue {
    List(Vec<Account>),
    Detail(Account),
}

/// Conversion between typed reads and the single stored representation.
pub(super) trait Stored: Clone + Send + Sync + 'static {
    fn into_stored(self) -> StoredValue;
    fn from_stored(value: &StoredValue) -> Option<Self>;
}

impl Stored for Vec<Account> {
    fn into_stored(self) -> StoredValue {
        StoredValue::List(self)
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::List(accounts) => Some(accounts.clone()),
            StoredValue::Detail(_) => None,
        }
    }
}

impl Stored for Account {
    fn into_stored(self) -> StoredValue {
        StoredValue::Detail(self)
    }

    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Detail(account) => Some(account.clone()),
            StoredValue::List(_) => None,
        }
    }
}

pub(super) type SharedFetch = Shared<BoxFuture<'static, Result<StoredValue, AccountGatewayError>>>;

pub(super) enum Phase {
    Fresh,
    Stale,
    Refetching(SharedFetch),
}

pub(super) struct Entry {
    pub(super) value: Option<StoredValue>,
    pub(super) fetched_at: Option<DateTime<Utc>>,
    pub(super) phase: Phase,
    /// Bumped by every write and invalidation so a refetch that started
    /// earlier cannot overwrite newer knowledge.
    pub(super) generation: u64,
}

impl Entry {
    pub(super) const fn empty() -> Self {
        Self {
            value: None,
            fetched_at: None,
            phase: Phase::Stale,
            generation: 0,
        }
    }

    pub(super) fn state(&self, now: DateTime<Utc>, stale_after: TimeDelta) -> EntryState {
        match self.phase {
            Phase::Fresh if self.is_expired(now, stale_after) => EntryState::Stale,
            Phase::Fresh => EntryState::Fresh,
            Phase::Stale => EntryState::Stale,
            Phase::Refetching(_) => EntryState::Refetching,
        }
    }

    pub(super) fn is_expired(&self, now: DateTime<Utc>, stale_after: TimeDelta) -> bool {
        self.fetched_at
            .is_none_or(|fetched_at| now.signed_duration_since(fetched_at) >= stale_after)
    }

    pub(super) fn store(&mut self, value: StoredValue, now: DateTime<Utc>) {
        self.value = Some(value);
        self.fetched_at = Some(now);
        self.phase = Phase::Fresh;
        self.generation = self.generation.wrapping_add(1);
    }

    pub(super) fn mark_stale(&mut self) {
        self.phase = Phase::Stale;
        self.generation = self.generation.wrapping_add(1);
    }
}
