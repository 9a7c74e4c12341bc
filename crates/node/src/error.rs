#![allow(missing_docs)]

use alloy_primitives::U256;
use blobcast_blob_engine::{EncodeError, KzgError};
use blobcast_execution::{BroadcastError, RpcError};
use blobcast_signer::SignerError;
use blobcast_types::{aliases::TxHash, api::ErrorResponse, payload::PayloadError};
use thiserror::Error;

/// Why a submission stopped.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("KZG commitment failed: {0}")]
    Kzg(#[from] KzgError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error("local signing failed: {0}")]
    LocalSigning(#[from] alloy_signer::Error),

    #[error("RPC request failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("insufficient balance: have {balance} wei, need {required} wei")]
    InsufficientBalance { balance: U256, required: U256 },

    #[error("{stage} broadcast failed: {source}")]
    Broadcast { stage: &'static str, source: BroadcastError },

    #[error("funding transfer {tx_hash} not confirmed after {attempts} attempts")]
    FundingTimeout { tx_hash: TxHash, attempts: u32 },

    #[error("{stage} transaction {tx_hash} reverted")]
    Reverted { stage: &'static str, tx_hash: TxHash },

    #[error("ephemeral account holds {balance} wei after funding, needs {required} wei")]
    FundingShortfall { balance: U256, required: U256 },

    /// A step after the funding transfer was mined failed; the transferred
    /// value sits in the discarded ephemeral account.
    #[error("{source} (funding transfer {transfer_hash})")]
    AfterFunding { transfer_hash: TxHash, source: Box<PipelineError> },
}

impl PipelineError {
    /// Wraps a failure that happened once `transfer_hash` had been mined.
    pub fn after_funding(transfer_hash: TxHash, source: Self) -> Self {
        Self::AfterFunding { transfer_hash, source: Box::new(source) }
    }

    /// HTTP status: 400 for problems with the request or with the funds of
    /// either the signer or the ephemeral account, 500 for everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Payload(_) |
            Self::Encode(_) |
            Self::InsufficientBalance { .. } |
            Self::FundingShortfall { .. } |
            Self::Broadcast { source: BroadcastError::InsufficientFunds(_), .. } => 400,
            Self::AfterFunding { source, .. } => source.status_code(),
            _ => 500,
        }
    }

    /// Short, stable description for the `error` field.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Payload(PayloadError::Missing) => "Missing payload",
            Self::Payload(_) => "Invalid payload",
            Self::Encode(_) => "Payload exceeds blob capacity",
            Self::Kzg(_) => "KZG commitment failed",
            Self::Signer(SignerError::KeyResolution { .. }) => "Signer key resolution failed",
            Self::Signer(SignerError::Signing { .. }) => "Remote signing failed",
            Self::Signer(SignerError::Recovery(_)) => "Signature recovery failed",
            Self::LocalSigning(_) => "Ephemeral signing failed",
            Self::Rpc(_) => "RPC request failed",
            Self::InsufficientBalance { .. } => "Insufficient balance",
            Self::Broadcast { source: BroadcastError::NonceConflict(_), .. } => "Nonce conflict",
            Self::Broadcast { source: BroadcastError::InsufficientFunds(_), .. } => "Insufficient funds",
            Self::Broadcast { .. } => "Transaction broadcast failed",
            Self::FundingTimeout { .. } => "Funding transfer not confirmed",
            Self::Reverted { .. } => "Transaction reverted",
            Self::FundingShortfall { .. } => "Ephemeral account underfunded",
            Self::AfterFunding { source, .. } => source.summary(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let mut response = ErrorResponse::new(self.summary()).with_details(self.to_string());
        let cause = match self {
            Self::AfterFunding { transfer_hash, source } => {
                response.eth_transfer_hash = Some(transfer_hash.to_string());
                source.as_ref()
            }
            other => other,
        };
        if let Self::InsufficientBalance { balance, required } |
        Self::FundingShortfall { balance, required } = cause
        {
            response.balance = Some(balance.to_string());
            response.required = Some(required.to_string());
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_error_carries_amounts() {
        let err = PipelineError::InsufficientBalance {
            balance: U256::ZERO,
            required: U256::from(1_000_000u64),
        };
        assert_eq!(err.status_code(), 400);

        let response = err.to_response();
        assert!(!response.success);
        assert_eq!(response.balance.as_deref(), Some("0"));
        assert_eq!(response.required.as_deref(), Some("1000000"));
    }

    #[test]
    fn infrastructure_errors_are_500() {
        let err = PipelineError::FundingTimeout { tx_hash: TxHash::ZERO, attempts: 30 };
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_response().balance, None);

        let err = PipelineError::Broadcast {
            stage: "blob",
            source: BroadcastError::NonceConflict("nonce too low".into()),
        };
        assert_eq!(err.summary(), "Nonce conflict");
        assert!(err.to_string().contains("nonce too low"));
    }

    #[test]
    fn ephemeral_funding_problems_are_400() {
        let err = PipelineError::FundingShortfall { balance: U256::from(5u64), required: U256::from(9u64) };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_response().required.as_deref(), Some("9"));

        let err = PipelineError::Broadcast {
            stage: "blob",
            source: BroadcastError::InsufficientFunds("insufficient funds for gas * price + value".into()),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.summary(), "Insufficient funds");

        let err = PipelineError::Broadcast {
            stage: "blob",
            source: BroadcastError::Rejected("intrinsic gas too low".into()),
        };
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn failure_after_funding_reports_transfer_hash() {
        let transfer = TxHash::repeat_byte(0x11);
        let err = PipelineError::after_funding(
            transfer,
            PipelineError::Reverted { stage: "blob", tx_hash: TxHash::repeat_byte(0x22) },
        );
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.summary(), "Transaction reverted");

        let response = err.to_response();
        assert_eq!(response.eth_transfer_hash, Some(transfer.to_string()));
        assert!(response.details.unwrap().contains(&transfer.to_string()));

        let body = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(body["ethTransferHash"], transfer.to_string());

        let err = PipelineError::after_funding(
            transfer,
            PipelineError::Broadcast {
                stage: "blob",
                source: BroadcastError::InsufficientFunds("insufficient funds".into()),
            },
        );
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn capacity_error_is_400() {
        let err = PipelineError::from(EncodeError::CapacityExceeded { size: 126_977, capacity: 126_976 });
        assert_eq!(err.status_code(), 400);
    }
}
