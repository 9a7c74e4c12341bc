//! Receipt polling.
//!
//! Both the submission pipeline and the standalone tracker poll
//! `eth_getTransactionReceipt` at a fixed interval up to an attempt ceiling.
//! RPC failures while polling use up an attempt; they are never fatal on
//! their own.

use std::time::Duration;

use blobcast_types::{
    aliases::TxHash,
    constants::{
        CONFIRMATION_INTERVAL_MS, CONFIRMATION_MAX_ATTEMPTS, TRACKER_INTERVAL_MS,
        TRACKER_MAX_ATTEMPTS,
    },
    receipt::ReceiptSummary,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{RpcError, TrackError},
    eth_rpc::{EthRpc, HttpEthRpc},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    /// 30 × 10 s, used while a submission request is open.
    pub const fn confirmation() -> Self {
        Self::new(CONFIRMATION_MAX_ATTEMPTS, Duration::from_millis(CONFIRMATION_INTERVAL_MS))
    }

    /// 120 × 5 s, used by the client-side tracker.
    pub const fn tracking() -> Self {
        Self::new(TRACKER_MAX_ATTEMPTS, Duration::from_millis(TRACKER_INTERVAL_MS))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::confirmation()
    }
}

/// A receipt and the number of polls it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub receipt: ReceiptSummary,
    pub attempts: u32,
}

/// Polls until a receipt appears.
pub async fn await_receipt<R: EthRpc + ?Sized>(
    rpc: &R,
    tx_hash: TxHash,
    policy: PollPolicy,
) -> Result<ReceiptSummary, TrackError> {
    poll_receipt(rpc, tx_hash, policy).await.map(|c| c.receipt)
}

/// [`await_receipt`], also reporting how many polls were made.
pub async fn poll_receipt<R: EthRpc + ?Sized>(
    rpc: &R,
    tx_hash: TxHash,
    policy: PollPolicy,
) -> Result<Confirmation, TrackError> {
    for attempt in 1..=policy.max_attempts {
        match rpc.transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => {
                if let Some(receipt) = receipt.summary() {
                    debug!(%tx_hash, attempt, block = receipt.block_number, "Receipt found");
                    return Ok(Confirmation { receipt, attempts: attempt });
                }
            }
            Ok(None) => debug!(%tx_hash, attempt, "Receipt not yet available"),
            Err(e) => warn!(%tx_hash, attempt, error = %e, "Receipt poll failed"),
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(TrackError::ConfirmationTimeout { tx_hash, attempts: policy.max_attempts })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackStatus {
    Pending,
    Confirmed,
    Failed,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingReport {
    pub transaction_hash: TxHash,
    pub status: TrackStatus,
    pub attempts: u32,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    pub blob_gas_used: Option<u64>,
}

impl TrackingReport {
    fn pending(transaction_hash: TxHash, attempts: u32) -> Self {
        Self {
            transaction_hash,
            status: TrackStatus::Pending,
            attempts,
            block_number: None,
            gas_used: None,
            blob_gas_used: None,
        }
    }

    fn from_receipt(receipt: ReceiptSummary, attempts: u32) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            status: if receipt.success { TrackStatus::Confirmed } else { TrackStatus::Failed },
            attempts,
            block_number: Some(receipt.block_number),
            gas_used: Some(receipt.gas_used),
            blob_gas_used: receipt.blob_gas_used,
        }
    }
}

/// Input of a standalone tracking job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub transaction_hash: TxHash,
    pub rpc_url: Url,
}

/// Follows an already-broadcast blob transaction to a terminal state.
#[derive(Debug, Clone)]
pub struct BlobTxTracker<R> {
    rpc: R,
    policy: PollPolicy,
}

impl BlobTxTracker<HttpEthRpc> {
    pub fn connect(url: Url) -> Result<Self, RpcError> {
        Ok(Self::new(HttpEthRpc::new(url)?, PollPolicy::tracking()))
    }
}

impl<R: EthRpc> BlobTxTracker<R> {
    pub fn new(rpc: R, policy: PollPolicy) -> Self {
        Self { rpc, policy }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Polls until the transaction is mined or the policy runs out.
    pub async fn track(&self, tx_hash: TxHash) -> TrackingReport {
        let report = match poll_receipt(&self.rpc, tx_hash, self.policy).await {
            Ok(Confirmation { receipt, attempts }) => TrackingReport::from_receipt(receipt, attempts),
            Err(TrackError::ConfirmationTimeout { attempts, .. }) => TrackingReport {
                status: TrackStatus::Timeout,
                ..TrackingReport::pending(tx_hash, attempts)
            },
        };
        info!(%tx_hash, status = ?report.status, attempts = report.attempts, "Tracking finished");
        report
    }

    /// A single receipt probe. Unlike [`track`](Self::track), RPC errors are
    /// returned to the caller.
    pub async fn check_once(&self, tx_hash: TxHash) -> Result<TrackingReport, RpcError> {
        let receipt = self.rpc.transaction_receipt(tx_hash).await?;
        Ok(match receipt.as_ref().and_then(|r| r.summary()) {
            Some(summary) => TrackingReport::from_receipt(summary, 1),
            None => TrackingReport::pending(tx_hash, 1),
        })
    }
}
