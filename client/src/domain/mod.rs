//! Domain primitives, ports and services for account synchronisation.
//!
//! Purpose: keep a local view of remote accounts consistent with the Account
//! Service after every write. Nothing here knows about HTTP or the command
//! line; adapters plug in through [`ports::AccountGateway`].
//!
//! Public surface:
//! - Account, AccountId, Amount and friends: validated records and inputs.
//! - AccountStore: keyed synchronisation store with explicit entry states.
//! - AccountSyncService: operations that call the gateway and apply the
//!   invalidation rules.
//! - AccountSyncError: caller-facing failure.

pub mod account;
mod account_service;
pub mod error;
pub mod ports;
pub mod sync;

pub use self::account::{
    Account, AccountHolder, AccountId, AccountValidationError, Amount, InitialBalance, NewAccount,
    Transfer,
};
pub use self::account_service::AccountSyncService;
pub use self::error::AccountSyncError;
pub use self::sync::{AccountStore, CacheEvent, DEFAULT_STALE_AFTER, EntryState};
