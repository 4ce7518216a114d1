//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::DEFAULT_STALE_AFTER;
use crate::outbound::http::DEFAULT_USER_AGENT;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors raised while interpreting [`ClientSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No base URL was configured.
    #[error("ACCOUNT_API_BASE_URL is not set")]
    MissingBaseUrl,
    /// The base URL did not parse.
    #[error("invalid base URL {value:?}: {source}")]
    InvalidBaseUrl {
        /// Raw configured value.
        value: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The base URL is not http or https.
    #[error("base URL scheme must be http or https, got {scheme:?}")]
    UnsupportedScheme {
        /// Rejected scheme.
        scheme: String,
    },
    /// The request timeout is zero.
    #[error("request timeout must be at least one second")]
    ZeroRequestTimeout,
}

/// Settings for reaching the Account Service and caching its answers.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACCOUNT_API")]
pub struct ClientSettings {
    /// Root of the Account Service REST API.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 10)]
    pub request_timeout_secs: u64,
    /// Age in seconds after which a cached entry is treated as stale.
    #[ortho_config(default = 300)]
    pub stale_after_secs: u64,
    /// Optional user-agent override.
    pub user_agent: Option<String>,
}

impl ClientSettings {
    /// Return the validated base URL.
    ///
    /// # Errors
    ///
    /// Fails when the URL is missing, malformed, or not http(s).
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SettingsError::MissingBaseUrl)?;
        let url = Url::parse(raw).map_err(|source| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SettingsError::UnsupportedScheme {
                scheme: other.to_owned(),
            }),
        }
    }

    /// Return the validated request timeout.
    ///
    /// # Errors
    ///
    /// Fails when the timeout is zero.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::ZeroRequestTimeout);
        }
        Ok(Duration::from_secs(self.request_timeout_secs))
    }

    /// Return the staleness window for cached entries.
    #[must_use]
    pub const fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Return the configured user-agent, falling back to the default.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            stale_after_secs: DEFAULT_STALE_AFTER.as_secs(),
            user_agent: None,
        }
    }
}
