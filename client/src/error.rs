//! Error types for the gated door client.
//!
//! Contract rejections keep their [`DoorError`] code so callers can match on
//! them; everything else describes a transport, configuration or local
//! failure.

use gated_door::DoorError;
use thiserror::Error;

/// Main error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// The contract refused the operation
    #[error("Contract rejected the operation: {0:?}")]
    Rejected(DoorError),

    /// The instruction could not be packed locally
    #[error("Instruction encoding failed: {0:?}")]
    Encoding(DoorError),

    /// The host failed outside the contract's own error codes
    #[error("Host error: {0}")]
    Host(String),

    /// Error communicating with Soroban RPC
    #[error("Soroban RPC error: {0}")]
    Rpc(String),

    /// Network communication error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Transaction timeout
    #[error("Transaction timeout after {0} seconds")]
    TransactionTimeout(u64),

    /// Transaction failed on chain
    #[error("Transaction {hash} failed: {message}")]
    TransactionFailed {
        /// Hash of the failed transaction
        hash: String,
        /// Failure description reported by the node
        message: String,
    },

    /// Transaction envelope is not valid base64 XDR
    #[error("Invalid transaction envelope: {0}")]
    InvalidEnvelope(#[from] base64::DecodeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No signer registered under this name
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    /// Slot purpose is not a valid symbol
    #[error("Invalid slot purpose: {0}")]
    InvalidPurpose(String),

    /// A scenario step produced something other than what it expects
    #[error("Unexpected outcome: {0}")]
    Unexpected(String),

    /// Max retries exceeded
    #[error("Max retries ({0}) exceeded")]
    MaxRetriesExceeded(usize),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Contract error code, if the contract rejected the call.
    pub fn rejection(&self) -> Option<DoorError> {
        match self {
            ClientError::Rejected(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<DoorError> for ClientError {
    fn from(code: DoorError) -> Self {
        ClientError::Rejected(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Rpc("test error".to_string());
        assert_eq!(err.to_string(), "Soroban RPC error: test error");

        let err = ClientError::Rejected(DoorError::QuorumNotMet);
        assert_eq!(
            err.to_string(),
            "Contract rejected the operation: QuorumNotMet"
        );
    }

    #[test]
    fn test_transaction_failed_error() {
        let err = ClientError::TransactionFailed {
            hash: "abc".to_string(),
            message: "txFailed".to_string(),
        };
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("txFailed"));
    }

    #[test]
    fn test_rejection_code() {
        let err: ClientError = DoorError::NotAnOwner.into();
        assert_eq!(err.rejection(), Some(DoorError::NotAnOwner));
        assert_eq!(ClientError::TransactionTimeout(5).rejection(), None);
    }
}
