//! Command-line driving adapter.
//!
//! Parses sub-commands with clap, validates amounts and identifiers into
//! domain types before any request is made, runs the matching
//! [`AccountSyncService`] operation and renders the result.

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::domain::ports::AccountGateway;
use crate::domain::{
    Account, AccountHolder, AccountId, AccountSyncError, AccountSyncService, Amount,
    InitialBalance, NewAccount,
};

/// `account-sync` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "account-sync",
    about = "Query and update accounts on the banking demo Account Service",
    version
)]
pub struct Cli {
    /// Print results as JSON instead of display lines.
    #[arg(long, global = true)]
    pub json: bool,
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed on the command line.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List accounts.
    List {
        /// Only show accounts that can take part in transfers.
        #[arg(long)]
        active: bool,
    },
    /// Show one account.
    Show {
        /// Account identifier.
        #[arg(value_parser = parse_account_id)]
        id: AccountId,
    },
    /// Open a new account.
    Create {
        /// Holder name.
        #[arg(long, value_parser = parse_holder)]
        holder: AccountHolder,
        /// Opening balance.
        #[arg(long = "initial-balance", value_parser = parse_initial_balance, default_value = "0")]
        initial_balance: InitialBalance,
    },
    /// Deposit into an account.
    Deposit {
        /// Account identifier.
        #[arg(value_parser = parse_account_id)]
        id: AccountId,
        /// Amount to deposit.
        #[arg(value_parser = parse_amount)]
        amount: Amount,
    },
    /// Withdraw from an account.
    Withdraw {
        /// Account identifier.
        #[arg(value_parser = parse_account_id)]
        id: AccountId,
        /// Amount to withdraw.
        #[arg(value_parser = parse_amount)]
        amount: Amount,
    },
    /// Move money between two accounts.
    Transfer {
        /// Debited account.
        #[arg(value_parser = parse_account_id)]
        from: AccountId,
        /// Credited account.
        #[arg(value_parser = parse_account_id)]
        to: AccountId,
        /// Amount to move.
        #[arg(value_parser = parse_amount)]
        amount: Amount,
    },
}

/// Failures surfaced by [`run`].
#[derive(Debug, Error)]
pub enum CliError {
    /// The operation failed.
    #[error(transparent)]
    Sync(#[from] AccountSyncError),
    /// The Account Service answered a transfer with a failure flag.
    #[error("transfer from {from} to {to} was declined by the account service")]
    TransferDeclined {
        /// Debited account.
        from: AccountId,
        /// Credited account.
        to: AccountId,
    },
    /// JSON rendering failed.
    #[error("failed to render JSON output: {0}")]
    Render(#[from] serde_json::Error),
    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Run `cli` against `service`, writing results to `out`.
///
/// # Errors
///
/// Returns [`CliError`] when the operation fails, a transfer is declined, or
/// output cannot be written.
pub async fn run<G, W>(
    cli: Cli,
    service: &AccountSyncService<G>,
    out: &mut W,
) -> Result<(), CliError>
where
    G: AccountGateway + 'static,
    W: Write,
{
    let json = cli.json;
    match cli.command {
        Command::List { active } => {
            let accounts = if active {
                service.active_accounts().await?
            } else {
                service.list_accounts().await?
            };
            render_accounts(out, json, &accounts)
        }
        Command::Show { id } => {
            let account = service.account(&id).await?;
            render_account(out, json, &account)
        }
        Command::Create {
            holder,
            initial_balance,
        } => {
            let request = NewAccount {
                holder,
                initial_balance,
            };
            let account = service.create_account(&request).await?;
            render_account(out, json, &account)
        }
        Command::Deposit { id, amount } => {
            let account = service.deposit(&id, amount).await?;
            render_account(out, json, &account)
        }
        Command::Withdraw { id, amount } => {
            let account = service.withdraw(&id, amount).await?;
            render_account(out, json, &account)
        }
        Command::Transfer { from, to, amount } => {
            if !service.transfer(&from, &to, amount).await? {
                return Err(CliError::TransferDeclined { from, to });
            }
            if json {
                serde_json::to_writer(&mut *out, &serde_json::json!({ "success": true }))?;
                writeln!(out)?;
            } else {
                writeln!(out, "Transferred ${amount} from {from} to {to}")?;
            }
            Ok(())
        }
    }
}

fn render_accounts<W: Write>(out: &mut W, json: bool, accounts: &[Account]) -> Result<(), CliError> {
    if json {
        serde_json::to_writer_pretty(&mut *out, accounts)?;
        writeln!(out)?;
        return Ok(());
    }
    for account in accounts {
        writeln!(out, "{}", account.display_label())?;
    }
    Ok(())
}

fn render_account<W: Write>(out: &mut W, json: bool, account: &Account) -> Result<(), CliError> {
    if json {
        serde_json::to_writer_pretty(&mut *out, account)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", account.display_label())?;
    }
    Ok(())
}

fn parse_account_id(raw: &str) -> Result<AccountId, String> {
    AccountId::new(raw).map_err(|error| error.to_string())
}

fn parse_holder(raw: &str) -> Result<AccountHolder, String> {
    AccountHolder::new(raw).map_err(|error| error.to_string())
}

fn parse_number(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|error| format!("expected a number: {error}"))
}

fn parse_amount(raw: &str) -> Result<Amount, String> {
    Amount::new(parse_number(raw)?).map_err(|error| error.to_string())
}

fn parse_initial_balance(raw: &str) -> Result<InitialBalance, String> {
    InitialBalance::new(parse_number(raw)?).map_err(|error| error.to_string())
}
