//! Chain-confirmed outcome of a submitted transaction.

use serde::Serialize;

use crate::aliases::{BlockNumber, TxHash};

/// The fields of a transaction receipt the service reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub transaction_hash: TxHash,
    pub block_number: BlockNumber,
    pub gas_used: u64,
    /// Present only for type-3 transactions.
    pub blob_gas_used: Option<u64>,
    /// `true` when the receipt status is 1.
    pub success: bool,
}
