//! Caller-facing error for account operations.
//!
//! Three categories reach the caller: client-side validation (raised before
//! any request), transport failures and decode failures. The last two keep
//! the gateway's error intact so callers can pick a recovery path.

use thiserror::Error;

use super::AccountValidationError;
use super::ports::AccountGatewayError;

/// Failure of an account operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountSyncError {
    /// Input rejected before contacting the server.
    #[error("invalid request: {0}")]
    Validation(#[from] AccountValidationError),
    /// The gateway call failed.
    #[error(transparent)]
    Gateway(#[from] AccountGatewayError),
}

impl AccountSyncError {
    /// Whether a manual retry may succeed.
    ///
    /// # Examples
    /// ```
    /// use account_sync::domain::AccountSyncError;
    /// use account_sync::domain::ports::AccountGatewayError;
    ///
    /// let err = AccountSyncError::from(AccountGatewayError::transport("timed out"));
    /// assert!(err.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Gateway(error) => error.is_retryable(),
        }
    }

    /// Whether the server answered with a payload this client cannot read.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Gateway(AccountGatewayError::Decode { .. }))
    }
}

#[cfg(test)]
mod tests {
    //! Category helpers on the caller-facing error.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccountSyncError::from(AccountValidationError::EmptyId), false, false)]
    #[case(AccountSyncError::from(AccountGatewayError::transport("reset")), true, false)]
    #[case(AccountSyncError::from(AccountGatewayError::decode("not an array")), false, true)]
    fn categories_are_reported(
        #[case] error: AccountSyncError,
        #[case] retryable: bool,
        #[case] decode: bool,
    ) {
        assert_eq!(error.is_retryable(), retryable);
        assert_eq!(error.is_decode(), decode);
    }

    #[rstest]
    fn validation_message_is_prefixed() {
        let error = AccountSyncError::from(AccountValidationError::SameAccountTransfer);
        assert_eq!(
            error.to_string(),
            "invalid request: cannot transfer to the same account"
        );
    }
}
