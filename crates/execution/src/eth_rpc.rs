use std::{sync::Arc, time::Duration};

use alloy_primitives::{Address, U64, U128, U256, hex};
use async_trait::async_trait;
use blobcast_types::aliases::TxHash;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::trace;

use crate::{
    error::RpcError,
    json_structures::{BlockFeeHeader, JsonRequestBody, JsonResponseBody, RpcReceipt},
};

/// The subset of the Ethereum JSON-RPC API used to submit and track blob
/// transactions.
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// `eth_getBalance` at `latest`.
    async fn balance(&self, address: Address) -> Result<U256, RpcError>;

    /// `eth_getTransactionCount` at `pending`.
    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError>;

    /// `baseFeePerGas` of the latest block.
    async fn latest_base_fee(&self) -> Result<u128, RpcError>;

    /// `eth_maxPriorityFeePerGas`
    async fn max_priority_fee(&self) -> Result<u128, RpcError>;

    /// `eth_sendRawTransaction`; returns the hash the node reports.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcError>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<RpcReceipt>, RpcError>;
}

#[async_trait]
impl<T: EthRpc + ?Sized> EthRpc for Arc<T> {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        (**self).chain_id().await
    }

    async fn balance(&self, address: Address) -> Result<U256, RpcError> {
        (**self).balance(address).await
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError> {
        (**self).pending_nonce(address).await
    }

    async fn latest_base_fee(&self) -> Result<u128, RpcError> {
        (**self).latest_base_fee().await
    }

    async fn max_priority_fee(&self) -> Result<u128, RpcError> {
        (**self).max_priority_fee().await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcError> {
        (**self).send_raw_transaction(raw).await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<RpcReceipt>, RpcError> {
        (**self).transaction_receipt(tx_hash).await
    }
}

/// JSON-RPC over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEthRpc {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpEthRpc {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(url: Url) -> Result<Self, RpcError> {
        let client = Client::builder().build().map_err(|e| RpcError::transport("client", e))?;
        Ok(Self { client, url, timeout: Self::DEFAULT_TIMEOUT })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn rpc_request<D: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<D, RpcError> {
        let body = JsonRequestBody { jsonrpc: "2.0", method, params, id: json!(1) };
        let request = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        let body: JsonResponseBody = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RpcError::transport(method, e))?
            .json()
            .await
            .map_err(|e| RpcError::invalid(method, e))?;

        trace!(method, "response body: {:?}", body);

        match (body.result, body.error) {
            (result, None) => serde_json::from_value(result).map_err(|e| RpcError::invalid(method, e)),
            (_, Some(error)) => {
                Err(RpcError::Server { method, code: error.code, message: error.message })
            }
        }
    }
}

#[async_trait]
impl EthRpc for HttpEthRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = self.rpc_request("eth_chainId", json!([])).await?;
        Ok(id.to())
    }

    async fn balance(&self, address: Address) -> Result<U256, RpcError> {
        self.rpc_request("eth_getBalance", json!([address, "latest"])).await
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError> {
        let nonce: U64 =
            self.rpc_request("eth_getTransactionCount", json!([address, "pending"])).await?;
        Ok(nonce.to())
    }

    async fn latest_base_fee(&self) -> Result<u128, RpcError> {
        let method = "eth_getBlockByNumber";
        let header: Option<BlockFeeHeader> = self.rpc_request(method, json!(["latest", false])).await?;
        header
            .ok_or_else(|| RpcError::invalid(method, "latest block not found"))?
            .base_fee_per_gas
            .map(|fee| fee.to())
            .ok_or_else(|| RpcError::invalid(method, "latest block has no baseFeePerGas"))
    }

    async fn max_priority_fee(&self) -> Result<u128, RpcError> {
        let fee: U128 = self.rpc_request("eth_maxPriorityFeePerGas", json!([])).await?;
        Ok(fee.to())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcError> {
        self.rpc_request("eth_sendRawTransaction", json!([hex::encode_prefixed(raw)])).await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<RpcReceipt>, RpcError> {
        self.rpc_request("eth_getTransactionReceipt", json!([tx_hash])).await
    }
}
