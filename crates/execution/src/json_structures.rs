use alloy_primitives::{U64, U128};
use blobcast_types::{aliases::TxHash, receipt::ReceiptSummary};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize)]
pub struct JsonRequestBody<'a> {
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: serde_json::Value,
    pub id: serde_json::Value,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonResponseBody {
    pub jsonrpc: String,
    #[serde(default)]
    pub error: Option<JsonError>,
    #[serde(default)]
    pub result: serde_json::Value,
    pub id: serde_json::Value,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonError {
    pub code: i64,
    pub message: String,
}

/// The part of `eth_getBlockByNumber` the fee estimator reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFeeHeader {
    pub number: U64,
    /// Absent before London.
    #[serde(default)]
    pub base_fee_per_gas: Option<U128>,
}

/// `eth_getTransactionReceipt` result, limited to the fields we report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<U64>,
    pub gas_used: U64,
    #[serde(default)]
    pub blob_gas_used: Option<U64>,
    /// `0x1` success, `0x0` reverted. Pre-Byzantium receipts omit it.
    #[serde(default)]
    pub status: Option<U64>,
}

impl RpcReceipt {
    /// Summary of a mined receipt, `None` while the block number is unknown.
    pub fn summary(&self) -> Option<ReceiptSummary> {
        let block_number = self.block_number?;
        Some(ReceiptSummary {
            transaction_hash: self.transaction_hash,
            block_number: block_number.to(),
            gas_used: self.gas_used.to(),
            blob_gas_used: self.blob_gas_used.map(|g| g.to()),
            success: self.status.is_none_or(|s| s == U64::from(1)),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn receipt_parses_blob_fields() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
            "blobGasUsed": "0x20000",
            "status": "0x1",
            "logs": []
        }))
        .unwrap();

        let summary = receipt.summary().unwrap();
        assert_eq!(summary.block_number, 16);
        assert_eq!(summary.gas_used, 21_000);
        assert_eq!(summary.blob_gas_used, Some(131_072));
        assert!(summary.success);
    }

    #[test]
    fn reverted_receipt_is_not_success() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "blockNumber": "0x1",
            "gasUsed": "0x5208",
            "status": "0x0"
        }))
        .unwrap();
        let summary = receipt.summary().unwrap();
        assert!(!summary.success);
        assert_eq!(summary.blob_gas_used, None);
    }

    #[test]
    fn block_header_without_base_fee() {
        let header: BlockFeeHeader =
            serde_json::from_value(json!({"number": "0x1", "hash": "0x00"})).unwrap();
        assert_eq!(header.base_fee_per_gas, None);
    }
}
