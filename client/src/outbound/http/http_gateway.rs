//! Reqwest-backed Account Service gateway.
//!
//! This adapter owns transport details only: URL building, request
//! serialisation, timeout and HTTP error mapping, and JSON decoding into
//! domain accounts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use thiserror::Error;
use tracing::debug;

use super::dto::{AccountDto, AmountBody, CreateAccountBody, TransferBody};
use crate::domain::ports::{AccountGateway, AccountGatewayError};
use crate::domain::{Account, AccountId, Amount, NewAccount, Transfer};

/// User-agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("account-sync/", env!("CARGO_PKG_VERSION"));

/// Errors raised while constructing [`HttpAccountGateway`].
#[derive(Debug, Error)]
pub enum HttpGatewayBuildError {
    /// The base URL cannot have path segments appended (e.g. `mailto:`).
    #[error("base URL {url} cannot be used as an API root")]
    UnusableBaseUrl {
        /// Rejected URL.
        url: Url,
    },
    /// The reqwest client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Account gateway that talks JSON over HTTP to one Account Service.
#[derive(Debug, Clone)]
pub struct HttpAccountGateway {
    client: Client,
    base_url: Url,
}

impl HttpAccountGateway {
    /// Build a gateway with an explicit request timeout.
    /// ```rust,ignore
    /// let gateway = HttpAccountGateway::new(base_url, Duration::from_secs(10))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the base URL cannot carry a path or the reqwest
    /// client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, HttpGatewayBuildError> {
        Self::with_user_agent(base_url, timeout, DEFAULT_USER_AGENT)
    }

    /// Build a gateway with an explicit user-agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot carry a path or the reqwest
    /// client cannot be constructed.
    pub fn with_user_agent(
        base_url: Url,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, HttpGatewayBuildError> {
        if base_url.cannot_be_a_base() {
            return Err(HttpGatewayBuildError::UnusableBaseUrl { url: base_url });
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        build_endpoint(&self.base_url, segments)
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, AccountGatewayError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let error = map_status_error(status, body.as_ref());
            debug!(operation, status = status.as_u16(), %error, "account service rejected request");
            return Err(error);
        }
        Ok(body.to_vec())
    }

    async fn account_request(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Account, AccountGatewayError> {
        let body = self.execute(operation, request).await?;
        parse_account(&body)
    }
}

#[async_trait]
impl AccountGateway for HttpAccountGateway {
    async fn fetch_all(&self) -> Result<Vec<Account>, AccountGatewayError> {
        let request = self.client.get(self.endpoint(&["accounts"]));
        let body = self.execute("fetch_all", request).await?;
        parse_accounts(&body)
    }

    async fn fetch_one(&self, id: &AccountId) -> Result<Account, AccountGatewayError> {
        let request = self.client.get(self.endpoint(&["accounts", id.as_str()]));
        self.account_request("fetch_one", request).await
    }

    async fn create(&self, account: &NewAccount) -> Result<Account, AccountGatewayError> {
        let request = self
            .client
            .post(self.endpoint(&["accounts"]))
            .json(&CreateAccountBody::from(account));
        self.account_request("create", request).await
    }

    async fn deposit(
        &self,
        id: &AccountId,
        amount: Amount,
    ) -> Result<Account, AccountGatewayError> {
        let request = self
            .client
            .post(self.endpoint(&["accounts", id.as_str(), "deposit"]))
            .json(&AmountBody::from(amount));
        self.account_request("deposit", request).await
    }

    async fn withdraw(
        &self,
        id: &AccountId,
        amount: Amount,
    ) -> Result<Account, AccountGatewayError> {
        let request = self
            .client
            .post(self.endpoint(&["accounts", id.as_str(), "withdraw"]))
            .json(&AmountBody::from(amount));
        self.account_request("withdraw", request).await
    }

    async fn transfer(&self, transfer: &Transfer) -> Result<bool, AccountGatewayError> {
        let request = self
            .client
            .post(self.endpoint(&["accounts", "transfer"]))
            .json(&TransferBody::from(transfer));
        // Success is carried by the status code; the body is not inspected.
        self.execute("transfer", request).await?;
        Ok(true)
    }
}

fn build_endpoint(base_url: &Url, segments: &[&str]) -> Url {
    let mut url = base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn parse_accounts(body: &[u8]) -> Result<Vec<Account>, AccountGatewayError> {
    let decoded: Vec<AccountDto> = serde_json::from_slice(body).map_err(|error| {
        AccountGatewayError::decode(format!("expected a JSON array of accounts: {error}"))
    })?;
    decoded
        .into_iter()
        .map(AccountDto::into_domain)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AccountGatewayError::decode)
}

fn parse_account(body: &[u8]) -> Result<Account, AccountGatewayError> {
    let decoded: AccountDto = serde_json::from_slice(body).map_err(|error| {
        AccountGatewayError::decode(format!("expected a JSON account object: {error}"))
    })?;
    decoded.into_domain().map_err(AccountGatewayError::decode)
}

fn map_transport_error(error: reqwest::Error) -> AccountGatewayError {
    if error.is_timeout() {
        AccountGatewayError::transport(format!("request timed out: {error}"))
    } else {
        AccountGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AccountGatewayError {
    let body_preview = body_preview(body);
    if body_preview.is_empty() {
        AccountGatewayError::transport(format!("status {}", status.as_u16()))
    } else {
        AccountGatewayError::transport(format!("status {}: {}", status.as_u16(), body_preview))
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
