//! Transaction builders and network encoding.

use alloy_consensus::{
    SignableTransaction, Signed, TxEip1559, TxEip4844, TxEip4844Variant, TxEip4844WithSidecar,
    TxEnvelope,
};
use alloy_eips::{eip2718::Encodable2718, eip4844::BlobTransactionSidecar};
use alloy_primitives::{Address, B256, Bytes, Signature, TxKind, U256};
use blobcast_types::{aliases::TxHash, constants::TRANSFER_GAS_LIMIT};

use crate::fees::FeeBudget;

/// EIP-1559 value transfer that funds the ephemeral account.
pub fn make_funding_tx(chain_id: u64, nonce: u64, to: Address, value: U256, fees: &FeeBudget) -> TxEip1559 {
    TxEip1559 {
        chain_id,
        nonce,
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        max_fee_per_gas: fees.max_fee_per_gas,
        gas_limit: TRANSFER_GAS_LIMIT,
        to: TxKind::Call(to),
        value,
        input: Bytes::default(),
        access_list: Default::default(),
    }
}

/// Type-3 transaction carrying one blob, value 0, no calldata.
pub fn make_blob_tx(
    chain_id: u64,
    nonce: u64,
    to: Address,
    versioned_hash: B256,
    fees: &FeeBudget,
) -> TxEip4844 {
    TxEip4844 {
        chain_id,
        nonce,
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        max_fee_per_gas: fees.max_fee_per_gas,
        gas_limit: TRANSFER_GAS_LIMIT,
        to,
        value: U256::ZERO,
        input: Bytes::default(),
        access_list: Default::default(),
        blob_versioned_hashes: vec![versioned_hash],
        max_fee_per_blob_gas: fees.max_fee_per_blob_gas,
    }
}

/// Pairs a type-3 transaction with its sidecar so it encodes in network form.
pub fn with_sidecar(tx: TxEip4844, sidecar: BlobTransactionSidecar) -> TxEip4844Variant {
    TxEip4844WithSidecar::from_tx_and_sidecar(tx, sidecar).into()
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub hash: TxHash,
    pub raw: Bytes,
}

impl SignedTx {
    pub fn from_envelope(envelope: &TxEnvelope) -> Self {
        Self { hash: *envelope.tx_hash(), raw: envelope.encoded_2718().into() }
    }

    /// Attaches an externally produced signature.
    pub fn assemble<T>(tx: T, signature: Signature) -> Self
    where
        T: SignableTransaction<Signature>,
        Signed<T>: Into<TxEnvelope>,
    {
        Self::from_envelope(&tx.into_signed(signature).into())
    }
}
