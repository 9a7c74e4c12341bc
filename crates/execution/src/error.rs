#![allow(missing_docs)]

use blobcast_types::aliases::TxHash;
use thiserror::Error;

/// Failure of a single JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("transport error calling {method}: {reason}")]
    Transport { method: &'static str, reason: String },

    #[error("{method} failed with code {code}: {message}")]
    Server { method: &'static str, code: i64, message: String },

    #[error("invalid response to {method}: {reason}")]
    InvalidResponse { method: &'static str, reason: String },
}

impl RpcError {
    pub(crate) fn transport(method: &'static str, reason: impl ToString) -> Self {
        Self::Transport { method, reason: reason.to_string() }
    }

    pub(crate) fn invalid(method: &'static str, reason: impl ToString) -> Self {
        Self::InvalidResponse { method, reason: reason.to_string() }
    }
}

/// Rejection of `eth_sendRawTransaction`, classified by the provider message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    /// `nonce too low`, `replacement transaction underpriced` or `already known`.
    #[error("nonce conflict: {0}")]
    NonceConflict(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The request never got a JSON-RPC answer.
    #[error(transparent)]
    Rpc(RpcError),
}

impl From<RpcError> for BroadcastError {
    fn from(err: RpcError) -> Self {
        let RpcError::Server { ref message, .. } = err else {
            return Self::Rpc(err);
        };
        let lower = message.to_lowercase();
        if lower.contains("nonce too low") ||
            lower.contains("replacement transaction underpriced") ||
            lower.contains("already known")
        {
            Self::NonceConflict(message.clone())
        } else if lower.contains("insufficient funds") {
            Self::InsufficientFunds(message.clone())
        } else {
            Self::Rejected(message.clone())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("transaction {tx_hash} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { tx_hash: TxHash, attempts: u32 },
}
