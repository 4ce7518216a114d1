//! DTOs for the Account Service JSON wire format.
//!
//! Responses decode into these transport DTOs first and are then mapped into
//! domain records in one pass. Every field is required; an unexpected shape
//! is a decode failure rather than a partially filled record.

use serde::{Deserialize, Serialize};

use crate::domain::{Account, AccountId, Amount, NewAccount, Transfer};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccountDto {
    pub(super) account_id: String,
    pub(super) account_holder: String,
    pub(super) balance: f64,
    pub(super) active: bool,
}

impl AccountDto {
    pub(super) fn into_domain(self) -> Result<Account, String> {
        let account_id = AccountId::new(self.account_id)
            .map_err(|error| format!("invalid accountId: {error}"))?;
        Account::new(account_id, self.account_holder, self.balance, self.active)
            .map_err(|error| format!("invalid account record: {error}"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateAccountBody<'a> {
    account_holder: &'a str,
    balance: f64,
    active: bool,
}

impl<'a> From<&'a NewAccount> for CreateAccountBody<'a> {
    fn from(account: &'a NewAccount) -> Self {
        Self {
            account_holder: account.holder.as_str(),
            balance: account.initial_balance.get(),
            active: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AmountBody {
    amount: f64,
}

impl From<Amount> for AmountBody {
    fn from(amount: Amount) -> Self {
        Self {
            amount: amount.get(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TransferBody<'a> {
    from_account_id: &'a str,
    to_account_id: &'a str,
    amount: f64,
}

impl<'a> From<&'a Transfer> for TransferBody<'a> {
    fn from(transfer: &'a Transfer) -> Self {
        Self {
            from_account_id: transfer.from_account().as_str(),
            to_account_id: transfer.to_account().as_str(),
            amount: transfer.amount().get(),
        }
    }
}
