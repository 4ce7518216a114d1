//! Account operations with cache synchronisation.
//!
//! Each operation calls the gateway and then applies the matching
//! invalidation rule to the [`AccountStore`]:
//!
//! - create: new record written to its detail entry, list marked stale
//! - deposit/withdraw: returned record replaces the detail entry, list marked
//!   stale
//! - transfer: both participants and the list marked stale
//!
//! A failed operation leaves the store untouched.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::{AccountCacheKey, AccountGateway, AccountGatewayError};
use super::sync::AccountStore;
use super::{Account, AccountId, AccountSyncError, Amount, NewAccount, Transfer};

/// Orchestrates gateway calls and store updates for one session.
pub struct AccountSyncService<G> {
    gateway: Arc<G>,
    store: AccountStore,
}

impl<G> Clone for AccountSyncService<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            store: self.store.clone(),
        }
    }
}

impl<G> AccountSyncService<G> {
    /// Create a service over `gateway`, synchronising into `store`.
    pub const fn new(gateway: Arc<G>, store: AccountStore) -> Self {
        Self { gateway, store }
    }

    /// Store shared with this service.
    #[must_use]
    pub const fn store(&self) -> &AccountStore {
        &self.store
    }
}

impl<G> AccountSyncService<G>
where
    G: AccountGateway + 'static,
{
    /// List every account, served from the store while fresh.
    ///
    /// # Errors
    ///
    /// Returns gateway failures from a refetch.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AccountSyncError> {
        let gateway = Arc::clone(&self.gateway);
        self.store
            .read_list(move || async move { gateway.fetch_all().await })
            .await
            .map_err(|error| Self::failed("list", None, error.into()))
    }

    /// Accounts eligible to take part in a transfer.
    ///
    /// # Errors
    ///
    /// Returns gateway failures from a refetch.
    pub async fn active_accounts(&self) -> Result<Vec<Account>, AccountSyncError> {
        let accounts = self.list_accounts().await?;
        Ok(accounts.into_iter().filter(Account::is_active).collect())
    }

    /// Fetch one account, served from the store while fresh.
    ///
    /// # Errors
    ///
    /// Returns gateway failures from a refetch, including a decode failure
    /// when the server answers with a different account.
    pub async fn account(&self, id: &AccountId) -> Result<Account, AccountSyncError> {
        let gateway = Arc::clone(&self.gateway);
        let requested = id.clone();
        self.store
            .read_account(id, move || async move {
                let account = gateway.fetch_one(&requested).await?;
                ensure_same_account(&requested, account)
            })
            .await
            .map_err(|error| Self::failed("fetch", Some(id), error.into()))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns gateway failures; the store is left untouched.
    pub async fn create_account(&self, account: &NewAccount) -> Result<Account, AccountSyncError> {
        let created = self
            .gateway
            .create(account)
            .await
            .map_err(|error| Self::failed("create", None, error.into()))?;

        debug!(account_id = %created.account_id(), "account created");
        self.store.write_account(created.clone());
        self.store.invalidate(&AccountCacheKey::List);
        Ok(created)
    }

    /// Deposit `amount` into `id`.
    ///
    /// # Errors
    ///
    /// Returns gateway failures; the store is left untouched.
    pub async fn deposit(&self, id: &AccountId, amount: Amount) -> Result<Account, AccountSyncError> {
        let result = self.gateway.deposit(id, amount).await;
        self.apply_balance_change("deposit", id, result)
    }

    /// Withdraw `amount` from `id`.
    ///
    /// # Errors
    ///
    /// Returns gateway failures; the store is left untouched.
    pub async fn withdraw(
        &self,
        id: &AccountId,
        amount: Amount,
    ) -> Result<Account, AccountSyncError> {
        let result = self.gateway.withdraw(id, amount).await;
        self.apply_balance_change("withdraw", id, result)
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// A same-account transfer is rejected before any request. On success
    /// both participants and the list are marked stale; no balance is
    /// computed locally because the server only reports a success flag.
    ///
    /// # Errors
    ///
    /// Returns validation or gateway failures; the store is left untouched.
    pub async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<bool, AccountSyncError> {
        let transfer = Transfer::new(from.clone(), to.clone(), amount)
            .map_err(|error| Self::failed("transfer", Some(from), error.into()))?;
        let succeeded = self
            .gateway
            .transfer(&transfer)
            .await
            .map_err(|error| Self::failed("transfer", Some(from), error.into()))?;

        if succeeded {
            self.store.invalidate(&AccountCacheKey::detail(from));
            self.store.invalidate(&AccountCacheKey::detail(to));
            self.store.invalidate(&AccountCacheKey::List);
        } else {
            debug!(from = %from, to = %to, "transfer declined by server; store untouched");
        }
        Ok(succeeded)
    }

    fn apply_balance_change(
        &self,
        operation: &'static str,
        id: &AccountId,
        result: Result<Account, AccountGatewayError>,
    ) -> Result<Account, AccountSyncError> {
        let updated = result
            .and_then(|account| ensure_same_account(id, account))
            .map_err(|error| Self::failed(operation, Some(id), error.into()))?;

        self.store.write_account(updated.clone());
        self.store.invalidate(&AccountCacheKey::List);
        Ok(updated)
    }

    fn failed(
        operation: &'static str,
        account_id: Option<&AccountId>,
        error: AccountSyncError,
    ) -> AccountSyncError {
        match account_id {
            Some(id) => warn!(operation, account_id = %id, %error, "account operation failed"),
            None => warn!(operation, %error, "account operation failed"),
        }
        error
    }
}

fn ensure_same_account(
    requested: &AccountId,
    account: Account,
) -> Result<Account, AccountGatewayError> {
    if account.account_id() == requested {
        Ok(account)
    } else {
        Err(AccountGatewayError::decode(format!(
            "response for account {requested} described account {}",
            account.account_id()
        )))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
