use alloy_primitives::U256;
use blobcast_types::constants::{BLOB_GAS_PER_BLOB, TRANSFER_GAS_LIMIT};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{error::RpcError, eth_rpc::EthRpc};

/// Fee caps shared by the funding transfer and the blob transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBudget {
    pub base_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    /// `2 * base_fee + priority_fee`, enough to survive a few full blocks.
    pub max_fee_per_gas: u128,
    pub max_fee_per_blob_gas: u128,
}

impl FeeBudget {
    pub fn new(base_fee_per_gas: u128, max_priority_fee_per_gas: u128, max_fee_per_blob_gas: u128) -> Self {
        let max_fee_per_gas =
            base_fee_per_gas.saturating_mul(2).saturating_add(max_priority_fee_per_gas);
        Self { base_fee_per_gas, max_priority_fee_per_gas, max_fee_per_gas, max_fee_per_blob_gas }
    }

    /// Reads the latest base fee and the suggested tip from the node.
    ///
    /// A node without `eth_maxPriorityFeePerGas` falls back to
    /// `default_priority_fee`. A missing base fee is an error.
    pub async fn estimate<R: EthRpc + ?Sized>(
        rpc: &R,
        default_priority_fee: u128,
        max_fee_per_blob_gas: u128,
    ) -> Result<Self, RpcError> {
        let base_fee = rpc.latest_base_fee().await?;
        let priority_fee = match rpc.max_priority_fee().await {
            Ok(fee) => fee,
            Err(e) => {
                warn!(error = %e, default_priority_fee, "Priority fee unavailable, using default");
                default_priority_fee
            }
        };

        let budget = Self::new(base_fee, priority_fee, max_fee_per_blob_gas);
        debug!(?budget, "Estimated fees");
        Ok(budget)
    }

    /// Worst-case cost of a 21000-gas transfer.
    pub fn transfer_fee(&self) -> U256 {
        U256::from(TRANSFER_GAS_LIMIT) * U256::from(self.max_fee_per_gas)
    }

    /// Worst-case cost of a one-blob, 21000-gas type-3 transaction.
    pub fn blob_tx_cost(&self) -> U256 {
        self.transfer_fee() + U256::from(BLOB_GAS_PER_BLOB) * U256::from(self.max_fee_per_blob_gas)
    }
}
