//! `account-sync` binary: run one account operation against the Account Service.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use account_sync::config::ClientSettings;
use account_sync::domain::{AccountStore, AccountSyncService};
use account_sync::inbound::cli::{self, Cli};
use account_sync::outbound::http::HttpAccountGateway;
use clap::Parser;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "{err}") {
                drop(write_err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> io::Result<()> {
    // Sub-command arguments belong to clap; settings come from the
    // environment and configuration files only.
    let settings = ClientSettings::load_from_iter([OsString::from("account-sync")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let base_url = settings
        .base_url()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
    let timeout = settings
        .request_timeout()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

    let gateway = HttpAccountGateway::with_user_agent(base_url, timeout, settings.user_agent())
        .map_err(|error| io::Error::other(format!("create account gateway: {error}")))?;
    let store = AccountStore::new(Arc::new(DefaultClock), settings.stale_after());
    let service = AccountSyncService::new(Arc::new(gateway), store);

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    let mut out = io::stdout().lock();
    runtime
        .block_on(cli::run(cli, &service, &mut out))
        .map_err(io::Error::other)
}
