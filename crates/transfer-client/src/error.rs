//! Error taxonomy of the transfer client

use common::{UNRECOGNIZED_CHAIN_CODE, USER_REJECTED_CODE};
use thiserror::Error;

/// Error surfaced by a wallet or RPC endpoint.
///
/// `code` carries the EIP-1193 / JSON-RPC error code when the endpoint
/// reported one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Error without a wire code (transport failure, malformed response)
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED_CODE, "User rejected the request.")
    }

    /// The user declined a wallet prompt
    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE) || self.message.contains("ACTION_REJECTED")
    }

    /// The wallet does not know the requested chain
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(UNRECOGNIZED_CHAIN_CODE)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::other(e.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::other(format!("malformed response: {e}"))
    }
}

/// Errors raised by client operations.
///
/// The `Display` text of each variant is the user-facing notice.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("Please install MetaMask!")]
    WalletUnavailable,

    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("Connection rejected by user")]
    ConnectionRejected,

    #[error("Failed to connect wallet")]
    ConnectionFailed(String),

    #[error("Invalid chain selected")]
    InvalidChain(String),

    #[error("Failed to switch network: {0}")]
    ChainSwitchFailed(String),

    #[error("Failed to add network: {0}")]
    ChainAddFailed(String),

    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Amount must be between {min} and {max} ETH")]
    OutOfBounds { min: f64, max: f64 },

    #[error("Transfer disabled: Insufficient inventory balance")]
    InsufficientInventory,

    #[error("Insufficient balance to cover transfer amount and gas fees")]
    InsufficientFunds,

    #[error("Transaction cancelled by user")]
    UserRejected,

    #[error("{0}")]
    SubmissionFailed(String),

    #[error("{0}")]
    QueryFailed(String),
}

impl ClientError {
    /// Maps a provider error raised while submitting or confirming a
    /// transaction.
    pub fn from_submission(e: ProviderError) -> Self {
        if e.is_user_rejection() {
            Self::UserRejected
        } else if e.message.is_empty() {
            Self::SubmissionFailed("Transfer failed".to_string())
        } else {
            Self::SubmissionFailed(e.message)
        }
    }
}

impl From<ProviderError> for ClientError {
    fn from(e: ProviderError) -> Self {
        if e.is_user_rejection() {
            Self::UserRejected
        } else {
            Self::QueryFailed(e.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_detection() {
        assert!(ProviderError::user_rejected().is_user_rejection());
        assert!(ProviderError::other("ACTION_REJECTED: denied").is_user_rejection());
        assert!(!ProviderError::new(-32000, "nonce too low").is_user_rejection());
        assert!(ProviderError::new(4902, "Unrecognized chain ID").is_unrecognized_chain());
    }

    #[test]
    fn test_notice_texts() {
        assert_eq!(
            ClientError::OutOfBounds { min: 0.0001, max: 1.0 }.to_string(),
            "Amount must be between 0.0001 and 1 ETH"
        );
        assert_eq!(
            ClientError::ChainSwitchFailed("boom".into()).to_string(),
            "Failed to switch network: boom"
        );
        assert_eq!(
            ClientError::from_submission(ProviderError::other("")).to_string(),
            "Transfer failed"
        );
        assert_eq!(
            ClientError::from_submission(ProviderError::user_rejected()),
            ClientError::UserRejected
        );
    }
}
