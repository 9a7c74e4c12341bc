//! Programmable Ethereum JSON-RPC double.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use alloy_consensus::{Transaction, TxEnvelope, transaction::SignerRecoverable};
use alloy_eips::{eip2718::Decodable2718, eip4844::DATA_GAS_PER_BLOB};
use alloy_primitives::{Address, Bytes, TxHash, U64, U256};
use async_trait::async_trait;
use blobcast_execution::{EthRpc, RpcError, RpcReceipt};

/// How the mock answers receipt polls for one kind of transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptBehavior {
    /// Mined with status 1 once the receipt has been polled `after_polls` times.
    Confirm { after_polls: u32 },
    /// Mined with status 0.
    Revert,
    /// Never mined.
    Never,
}

/// A transaction accepted by `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub hash: TxHash,
    pub raw: Bytes,
    pub envelope: TxEnvelope,
    pub from: Address,
}

impl SentTx {
    pub fn is_blob(&self) -> bool {
        self.envelope.is_eip4844()
    }

    /// What the sender must hold for the node to accept the transaction.
    pub fn max_cost(&self) -> U256 {
        max_cost(&self.envelope)
    }
}

/// `gas_limit * max_fee_per_gas + blob_gas * max_fee_per_blob_gas + value`.
fn max_cost(envelope: &TxEnvelope) -> U256 {
    let blob_gas = envelope.blob_versioned_hashes().map_or(0, |h| h.len() as u64) * DATA_GAS_PER_BLOB;
    U256::from(envelope.gas_limit()) * U256::from(envelope.max_fee_per_gas()) +
        U256::from(blob_gas) * U256::from(envelope.max_fee_per_blob_gas().unwrap_or_default()) +
        envelope.value()
}

#[derive(Debug)]
struct State {
    chain_id: u64,
    base_fee: Option<u128>,
    priority_fee: Option<u128>,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    funding_receipts: ReceiptBehavior,
    blob_receipts: ReceiptBehavior,
    broadcast_error: Option<RpcError>,
    reported_hash: Option<TxHash>,
    sent: Vec<SentTx>,
    polls: HashMap<TxHash, u32>,
    block_number: u64,
}

/// In-memory [`EthRpc`].
///
/// Accepted transactions debit the sender's worst-case cost and credit the
/// value to the recipient. A sender that cannot cover the worst case is
/// rejected with `insufficient funds`, like a real node.
#[derive(Debug)]
pub struct MockEthRpc {
    state: Mutex<State>,
}

impl Default for MockEthRpc {
    fn default() -> Self {
        Self::new(11_155_111)
    }
}

impl MockEthRpc {
    pub const BLOB_GAS_USED: u64 = 131_072;
    pub const GAS_USED: u64 = 21_000;

    pub fn new(chain_id: u64) -> Self {
        Self {
            state: Mutex::new(State {
                chain_id,
                base_fee: Some(1_000_000_000),
                priority_fee: Some(1_000_000_000),
                balances: HashMap::new(),
                nonces: HashMap::new(),
                funding_receipts: ReceiptBehavior::Confirm { after_polls: 1 },
                blob_receipts: ReceiptBehavior::Confirm { after_polls: 1 },
                broadcast_error: None,
                reported_hash: None,
                sent: Vec::new(),
                polls: HashMap::new(),
                block_number: 7_000_000,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_balance(self, address: Address, balance: U256) -> Self {
        self.state().balances.insert(address, balance);
        self
    }

    pub fn with_nonce(self, address: Address, nonce: u64) -> Self {
        self.state().nonces.insert(address, nonce);
        self
    }

    /// `None` makes the latest block look pre-London.
    pub fn with_base_fee(self, base_fee: Option<u128>) -> Self {
        self.state().base_fee = base_fee;
        self
    }

    /// `None` makes `eth_maxPriorityFeePerGas` fail.
    pub fn with_priority_fee(self, priority_fee: Option<u128>) -> Self {
        self.state().priority_fee = priority_fee;
        self
    }

    pub fn with_funding_receipts(self, behavior: ReceiptBehavior) -> Self {
        self.state().funding_receipts = behavior;
        self
    }

    pub fn with_blob_receipts(self, behavior: ReceiptBehavior) -> Self {
        self.state().blob_receipts = behavior;
        self
    }

    /// Rejects every broadcast with a JSON-RPC error carrying `message`.
    pub fn with_broadcast_error(self, message: &str) -> Self {
        self.state().broadcast_error = Some(RpcError::Server {
            method: "eth_sendRawTransaction",
            code: -32000,
            message: message.to_string(),
        });
        self
    }

    /// Answers broadcasts with `hash` instead of the real transaction hash.
    pub fn with_reported_hash(self, hash: TxHash) -> Self {
        self.state().reported_hash = Some(hash);
        self
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.state().balances.get(&address).copied().unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state().sent.clone()
    }

    pub fn sent_blob_txs(&self) -> Vec<SentTx> {
        self.sent().into_iter().filter(SentTx::is_blob).collect()
    }

    /// Times `eth_getTransactionReceipt` was called for `hash`.
    pub fn receipt_polls(&self, hash: TxHash) -> u32 {
        self.state().polls.get(&hash).copied().unwrap_or_default()
    }

    fn server_error(method: &'static str, message: &str) -> RpcError {
        RpcError::Server { method, code: -32000, message: message.to_string() }
    }
}

#[async_trait]
impl EthRpc for MockEthRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.state().chain_id)
    }

    async fn balance(&self, address: Address) -> Result<U256, RpcError> {
        Ok(self.balance_of(address))
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError> {
        Ok(self.state().nonces.get(&address).copied().unwrap_or_default())
    }

    async fn latest_base_fee(&self) -> Result<u128, RpcError> {
        self.state().base_fee.ok_or_else(|| RpcError::InvalidResponse {
            method: "eth_getBlockByNumber",
            reason: "latest block has no baseFeePerGas".to_string(),
        })
    }

    async fn max_priority_fee(&self) -> Result<u128, RpcError> {
        self.state()
            .priority_fee
            .ok_or_else(|| Self::server_error("eth_maxPriorityFeePerGas", "method not found"))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcError> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..]).map_err(|e| {
            Self::server_error("eth_sendRawTransaction", &format!("rlp: {e}"))
        })?;
        let from = envelope.recover_signer().map_err(|e| {
            Self::server_error("eth_sendRawTransaction", &format!("invalid sender: {e}"))
        })?;

        let mut state = self.state();
        if let Some(err) = state.broadcast_error.clone() {
            return Err(err);
        }

        let expected_nonce = state.nonces.get(&from).copied().unwrap_or_default();
        if envelope.nonce() < expected_nonce {
            return Err(Self::server_error("eth_sendRawTransaction", "nonce too low"));
        }

        let cost = max_cost(&envelope);
        let balance = state.balances.get(&from).copied().unwrap_or_default();
        if balance < cost {
            return Err(Self::server_error(
                "eth_sendRawTransaction",
                &format!("insufficient funds for gas * price + value: balance {balance}, tx cost {cost}"),
            ));
        }
        state.balances.insert(from, balance - cost);

        let hash = *envelope.tx_hash();
        let value = envelope.value();
        if let Some(to) = envelope.to() &&
            !value.is_zero()
        {
            *state.balances.entry(to).or_default() += value;
        }
        state.nonces.insert(from, envelope.nonce() + 1);
        state.sent.push(SentTx { hash, raw: Bytes::copy_from_slice(raw), envelope, from });

        Ok(state.reported_hash.unwrap_or(hash))
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<RpcReceipt>, RpcError> {
        let mut state = self.state();
        let polls = {
            let polls = state.polls.entry(tx_hash).or_default();
            *polls += 1;
            *polls
        };

        let Some(sent) = state.sent.iter().find(|tx| tx.hash == tx_hash) else {
            return Ok(None);
        };
        let is_blob = sent.is_blob();
        let behavior = if is_blob { state.blob_receipts } else { state.funding_receipts };

        let status = match behavior {
            ReceiptBehavior::Confirm { after_polls } if polls >= after_polls => 1,
            ReceiptBehavior::Confirm { .. } | ReceiptBehavior::Never => return Ok(None),
            ReceiptBehavior::Revert => 0,
        };

        state.block_number += 1;
        Ok(Some(RpcReceipt {
            transaction_hash: tx_hash,
            block_number: Some(U64::from(state.block_number)),
            gas_used: U64::from(Self::GAS_USED),
            blob_gas_used: is_blob.then(|| U64::from(Self::BLOB_GAS_USED)),
            status: Some(U64::from(status)),
        }))
    }
}
