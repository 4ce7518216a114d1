//! Driven port for the remote Account Service.
//!
//! The domain owns the operation set and the error taxonomy so the
//! synchronisation layer stays adapter-agnostic. Inputs arrive already
//! validated: a non-positive amount or a same-account transfer cannot be
//! expressed, so an adapter never issues such a request.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Account, AccountId, Amount, NewAccount, Transfer};

define_port_error! {
    /// Errors surfaced while calling the Account Service.
    pub enum AccountGatewayError {
        /// Network failure, timeout, or a non-2xx response.
        Transport { message: String } =>
            "account service transport failed: {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } =>
            "account service response decode failed: {message}",
    }
}

impl AccountGatewayError {
    /// Return whether retrying this error is expected to help.
    ///
    /// Decode failures point at a contract mismatch, so a retry would return
    /// the same payload.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Port translating account operations into remote calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Fetch every account.
    async fn fetch_all(&self) -> Result<Vec<Account>, AccountGatewayError>;

    /// Fetch one account by id.
    async fn fetch_one(&self, id: &AccountId) -> Result<Account, AccountGatewayError>;

    /// Create an account and return the server's record.
    async fn create(&self, account: &NewAccount) -> Result<Account, AccountGatewayError>;

    /// Deposit into an account and return the updated record.
    async fn deposit(&self, id: &AccountId, amount: Amount)
    -> Result<Account, AccountGatewayError>;

    /// Withdraw from an account and return the updated record.
    async fn withdraw(
        &self,
        id: &AccountId,
        amount: Amount,
    ) -> Result<Account, AccountGatewayError>;

    /// Move money between two accounts.
    ///
    /// Returns the server's success flag. The flag says nothing about which
    /// leg failed; atomicity is the server's contract.
    async fn transfer(&self, transfer: &Transfer) -> Result<bool, AccountGatewayError>;
}
