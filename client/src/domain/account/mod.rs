//! Account records and the validated inputs used to move money.
//!
//! Balances are whatever the remote Account Service last reported. Nothing in
//! this module computes a balance; the numeric newtypes only guard the values
//! sent over the wire so an invalid request can never be constructed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors raised before any request reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountValidationError {
    /// Account id is empty.
    #[error("account id must not be empty")]
    EmptyId,
    /// Account id has leading or trailing whitespace.
    #[error("account id must not contain surrounding whitespace")]
    IdContainsWhitespace,
    /// Account holder is empty once trimmed.
    #[error("account holder must not be empty")]
    EmptyHolder,
    /// Amount is NaN or infinite.
    #[error("amount must be a finite number")]
    NonFiniteAmount,
    /// Amount is zero or negative.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    /// Initial balance is negative.
    #[error("initial balance must not be negative")]
    NegativeInitialBalance,
    /// Balance is NaN or infinite.
    #[error("balance must be a finite number")]
    NonFiniteBalance,
    /// Transfer source and destination are the same account.
    #[error("cannot transfer to the same account")]
    SameAccountTransfer,
}

/// Server-assigned account identifier.
///
/// Immutable once the server has created the account. Serialises as a bare
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Validate and construct an [`AccountId`].
    ///
    /// # Examples
    /// ```
    /// use account_sync::domain::AccountId;
    ///
    /// let id = AccountId::new("acc-1")?;
    /// assert_eq!(id.as_str(), "acc-1");
    /// assert!(AccountId::new(" acc-1").is_err());
    /// # Ok::<(), account_sync::domain::AccountValidationError>(())
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, AccountValidationError> {
        let raw = id.into();
        if raw.trim().is_empty() {
            return Err(AccountValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(AccountValidationError::IdContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Canonical account record as last reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    account_id: AccountId,
    account_holder: String,
    balance: f64,
    active: bool,
}

impl Account {
    /// Build an account record, rejecting non-finite balances.
    ///
    /// # Errors
    ///
    /// Returns [`AccountValidationError::NonFiniteBalance`] when `balance` is
    /// NaN or infinite.
    pub fn new(
        account_id: AccountId,
        account_holder: impl Into<String>,
        balance: f64,
        active: bool,
    ) -> Result<Self, AccountValidationError> {
        if !balance.is_finite() {
            return Err(AccountValidationError::NonFiniteBalance);
        }
        Ok(Self {
            account_id,
            account_holder: account_holder.into(),
            balance,
            active,
        })
    }

    /// Server-assigned identifier.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Name of the account holder.
    #[must_use]
    pub fn account_holder(&self) -> &str {
        self.account_holder.as_str()
    }

    /// Last known balance.
    #[must_use]
    pub const fn balance(&self) -> f64 {
        self.balance
    }

    /// Whether the account can take part in transfers.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// One-line label, e.g. `Alice (acc-1) - $100.00`.
    #[must_use]
    pub fn display_label(&self) -> String {
        format!(
            "{} ({}) - ${:.2}",
            self.account_holder, self.account_id, self.balance
        )
    }
}

/// Name of the holder for a new account. Stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccountHolder(String);

impl AccountHolder {
    /// Validate and construct an [`AccountHolder`].
    ///
    /// # Errors
    ///
    /// Returns [`AccountValidationError::EmptyHolder`] for blank input.
    pub fn new(holder: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let trimmed = holder.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AccountValidationError::EmptyHolder);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the holder name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AccountHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strictly positive, finite money amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Amount(f64);

impl Amount {
    /// Validate and construct an [`Amount`].
    ///
    /// # Examples
    /// ```
    /// use account_sync::domain::{AccountValidationError, Amount};
    ///
    /// assert_eq!(Amount::new(12.5)?.get(), 12.5);
    /// assert_eq!(Amount::new(0.0), Err(AccountValidationError::NonPositiveAmount));
    /// # Ok::<(), AccountValidationError>(())
    /// ```
    pub fn new(value: f64) -> Result<Self, AccountValidationError> {
        if !value.is_finite() {
            return Err(AccountValidationError::NonFiniteAmount);
        }
        if value <= 0.0 {
            return Err(AccountValidationError::NonPositiveAmount);
        }
        Ok(Self(value))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Opening balance for a new account: finite and not negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct InitialBalance(f64);

impl InitialBalance {
    /// Validate and construct an [`InitialBalance`].
    ///
    /// # Errors
    ///
    /// Rejects NaN, infinities and negative values.
    pub fn new(value: f64) -> Result<Self, AccountValidationError> {
        if !value.is_finite() {
            return Err(AccountValidationError::NonFiniteAmount);
        }
        if value < 0.0 {
            return Err(AccountValidationError::NegativeInitialBalance);
        }
        Ok(Self(value))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// Holder name.
    pub holder: AccountHolder,
    /// Opening balance.
    pub initial_balance: InitialBalance,
}

impl NewAccount {
    /// Validate raw inputs into a [`NewAccount`].
    ///
    /// # Errors
    ///
    /// Propagates holder and balance validation failures.
    pub fn new(holder: impl AsRef<str>, initial_balance: f64) -> Result<Self, AccountValidationError> {
        Ok(Self {
            holder: AccountHolder::new(holder)?,
            initial_balance: InitialBalance::new(initial_balance)?,
        })
    }
}

/// Money movement between two distinct accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    from: AccountId,
    to: AccountId,
    amount: Amount,
}

impl Transfer {
    /// Build a transfer, rejecting same-account moves.
    ///
    /// # Examples
    /// ```
    /// use account_sync::domain::{AccountId, AccountValidationError, Amount, Transfer};
    ///
    /// let a = AccountId::new("a")?;
    /// let result = Transfer::new(a.clone(), a, Amount::new(1.0)?);
    /// assert_eq!(result, Err(AccountValidationError::SameAccountTransfer));
    /// # Ok::<(), AccountValidationError>(())
    /// ```
    pub fn new(from: AccountId, to: AccountId, amount: Amount) -> Result<Self, AccountValidationError> {
        if from == to {
            return Err(AccountValidationError::SameAccountTransfer);
        }
        Ok(Self { from, to, amount })
    }

    /// Debited account.
    #[must_use]
    pub fn from_account(&self) -> &AccountId {
        &self.from
    }

    /// Credited account.
    #[must_use]
    pub fn to_account(&self) -> &AccountId {
        &self.to
    }

    /// Amount moved.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }
}
