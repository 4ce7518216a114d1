//! Keys addressing entries in the account synchronisation store.

use std::fmt;

use crate::domain::AccountId;

/// Either the account-list entry or one account's detail entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccountCacheKey {
    /// Result of listing every account.
    List,
    /// One account's record.
    Detail(AccountId),
}

impl AccountCacheKey {
    /// Detail key for `id`.
    #[must_use]
    pub fn detail(id: &AccountId) -> Self {
        Self::Detail(id.clone())
    }

    /// Whether this key addresses the account list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List)
    }
}

impl fmt::Display for AccountCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("accounts:list"),
            Self::Detail(id) => write!(f, "accounts:detail:{id}"),
        }
    }
}
