//! Test utilities for the account-sync crate.
//!
//! Provides an in-memory stand-in for the remote Account Service that
//! implements the gateway port, counts calls per operation and can be told to
//! fail the next call. It is compiled for unit tests and behind the
//! `test-support` feature for integration tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{AccountGateway, AccountGatewayError};
use crate::domain::{Account, AccountId, AccountValidationError, Amount, NewAccount, Transfer};

/// Gateway operations counted by [`InMemoryAccountService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    /// `fetch_all`
    FetchAll,
    /// `fetch_one`
    FetchOne,
    /// `create`
    Create,
    /// `deposit`
    Deposit,
    /// `withdraw`
    Withdraw,
    /// `transfer`
    Transfer,
}

#[derive(Debug, Default)]
struct ServiceState {
    accounts: BTreeMap<AccountId, Account>,
    next_id: u64,
    calls: HashMap<GatewayOperation, usize>,
    pending_failure: Option<AccountGatewayError>,
}

/// In-memory Account Service owning the authoritative balances.
#[derive(Debug, Default)]
pub struct InMemoryAccountService {
    state: Mutex<ServiceState>,
}

impl InMemoryAccountService {
    /// Start with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `accounts` already on the server.
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let service = Self::new();
        for account in accounts {
            service.insert(account);
        }
        service
    }

    /// Replace or add an account server-side, bypassing any client.
    pub fn insert(&self, account: Account) {
        self.state()
            .accounts
            .insert(account.account_id().clone(), account);
    }

    /// Server-side view of an account.
    #[must_use]
    pub fn account(&self, id: &AccountId) -> Option<Account> {
        self.state().accounts.get(id).cloned()
    }

    /// Fail the next gateway call with `error`.
    pub fn fail_next(&self, error: AccountGatewayError) {
        self.state().pending_failure = Some(error);
    }

    /// Number of calls made for `operation`.
    #[must_use]
    pub fn calls(&self, operation: GatewayOperation) -> usize {
        self.state().calls.get(&operation).copied().unwrap_or_default()
    }

    fn begin(&self, operation: GatewayOperation) -> Result<MutexGuard<'_, ServiceState>, AccountGatewayError> {
        let mut state = self.state();
        *state.calls.entry(operation).or_default() += 1;
        match state.pending_failure.take() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(id: &AccountId) -> AccountGatewayError {
    AccountGatewayError::transport(format!("status 404: account {id} not found"))
}

fn rebalance(account: &Account, balance: f64) -> Result<Account, AccountGatewayError> {
    Account::new(
        account.account_id().clone(),
        account.account_holder(),
        balance,
        account.is_active(),
    )
    .map_err(|error: AccountValidationError| {
        AccountGatewayError::transport(format!("status 500: {error}"))
    })
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Credit,
    Debit,
}

#[expect(
    clippy::float_arithmetic,
    reason = "the in-memory service owns the authoritative balances"
)]
fn apply_delta(
    state: &mut ServiceState,
    id: &AccountId,
    amount: f64,
    direction: Direction,
) -> Result<Account, AccountGatewayError> {
    let current = state.accounts.get(id).ok_or_else(|| not_found(id))?;
    let balance = match direction {
        Direction::Credit => current.balance() + amount,
        Direction::Debit => current.balance() - amount,
    };
    if balance < 0.0 {
        return Err(AccountGatewayError::transport(
            "status 422: insufficient funds",
        ));
    }
    let updated = rebalance(current, balance)?;
    state.accounts.insert(id.clone(), updated.clone());
    Ok(updated)
}

#[async_trait]
impl AccountGateway for InMemoryAccountService {
    async fn fetch_all(&self) -> Result<Vec<Account>, AccountGatewayError> {
        let state = self.begin(GatewayOperation::FetchAll)?;
        Ok(state.accounts.values().cloned().collect())
    }

    async fn fetch_one(&self, id: &AccountId) -> Result<Account, AccountGatewayError> {
        let state = self.begin(GatewayOperation::FetchOne)?;
        state.accounts.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn create(&self, account: &NewAccount) -> Result<Account, AccountGatewayError> {
        let mut state = self.begin(GatewayOperation::Create)?;
        state.next_id += 1;
        let id = AccountId::new(format!("acc-{}", state.next_id))
            .map_err(|error| AccountGatewayError::transport(format!("status 500: {error}")))?;
        let created = Account::new(
            id.clone(),
            account.holder.as_str(),
            account.initial_balance.get(),
            true,
        )
        .map_err(|error| AccountGatewayError::transport(format!("status 500: {error}")))?;
        state.accounts.insert(id, created.clone());
        Ok(created)
    }

    async fn deposit(&self, id: &AccountId, amount: Amount) -> Result<Account, AccountGatewayError> {
        let mut state = self.begin(GatewayOperation::Deposit)?;
        apply_delta(&mut state, id, amount.get(), Direction::Credit)
    }

    async fn withdraw(
        &self,
        id: &AccountId,
        amount: Amount,
    ) -> Result<Account, AccountGatewayError> {
        let mut state = self.begin(GatewayOperation::Withdraw)?;
        apply_delta(&mut state, id, amount.get(), Direction::Debit)
    }

    async fn transfer(&self, transfer: &Transfer) -> Result<bool, AccountGatewayError> {
        let mut state = self.begin(GatewayOperation::Transfer)?;
        let participants_active = [transfer.from_account(), transfer.to_account()]
            .into_iter()
            .all(|id| state.accounts.get(id).is_some_and(Account::is_active));
        if !participants_active {
            return Ok(false);
        }
        let amount = transfer.amount().get();
        if apply_delta(&mut state, transfer.from_account(), amount, Direction::Debit).is_err() {
            return Ok(false);
        }
        apply_delta(&mut state, transfer.to_account(), amount, Direction::Credit)?;
        Ok(true)
    }
}
