//! Ethereum execution-layer plumbing: JSON-RPC, fees, transaction building,
//! broadcast classification and receipt tracking.

pub mod ephemeral;
pub mod error;
pub mod eth_rpc;
pub mod fees;
pub mod json_structures;
pub mod tracker;
pub mod tx;

pub use ephemeral::EphemeralAccount;
pub use error::{BroadcastError, RpcError, TrackError};
pub use eth_rpc::{EthRpc, HttpEthRpc};
pub use fees::FeeBudget;
pub use json_structures::RpcReceipt;
pub use tracker::{
    BlobTxTracker, Confirmation, PollPolicy, TrackRequest, TrackStatus, TrackingReport,
    await_receipt, poll_receipt,
};
pub use tx::SignedTx;
