//! JSON bodies returned by the HTTP API.

use serde::{Deserialize, Serialize};

/// Successful submission.
///
/// `eth_transfer_hash` and `etherscan_transfer_url` are `None` when no
/// funding transfer was made; `block_number`, `gas_used` and `blob_gas_used`
/// are `None` when the blob transaction was sent but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub blob_transaction_hash: String,
    pub eth_transfer_hash: Option<String>,
    pub block_number: Option<u64>,
    pub blob_hash: String,
    pub gas_used: Option<String>,
    pub blob_gas_used: Option<String>,
    pub etherscan_blob_url: String,
    pub etherscan_transfer_url: Option<String>,
    pub blob_url: String,
    pub signer_address: String,
    pub data_size: usize,
    pub kms_key_id: String,
}

/// Failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Signer balance in wei, set for balance errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    /// Amount in wei the submission needed, set for balance errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    /// Funding transfer already mined when a later step failed.
    #[serde(rename = "ethTransferHash", default, skip_serializing_if = "Option::is_none")]
    pub eth_transfer_hash: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
            balance: None,
            required: None,
            eth_transfer_hash: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub signer_address: String,
    pub kms_key_id: String,
}
