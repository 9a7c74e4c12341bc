//! Client-side tracking of a blob transaction submitted through the pipeline.

mod common;

use std::{sync::Arc, time::Duration};

use alloy_primitives::TxHash;
use blobcast_execution::{BlobTxTracker, PollPolicy, TrackStatus};
use blobcast_test_support::{LocalKeyBackend, ReceiptBehavior};
use blobcast_types::submission::FundingMode;
use common::{Harness, example_payload, fast_config, funded_rpc};

fn policy(max_attempts: u32) -> PollPolicy {
    PollPolicy::new(max_attempts, Duration::from_millis(1))
}

#[tokio::test]
async fn tracker_follows_a_submission_the_pipeline_left_pending() {
    let backend = LocalKeyBackend::from_seed(0x71);
    let rpc = funded_rpc(&backend).with_blob_receipts(ReceiptBehavior::Confirm { after_polls: 5 });
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));

    // Three pipeline polls are not enough.
    let response = h.submitter.submit(example_payload()).await.unwrap();
    assert_eq!(response.block_number, None);
    let tx_hash: TxHash = response.blob_transaction_hash.parse().unwrap();

    let tracker = BlobTxTracker::new(Arc::clone(&h.rpc), policy(10));
    let pending = tracker.check_once(tx_hash).await.unwrap();
    assert_eq!(pending.status, TrackStatus::Pending);

    let report = tracker.track(tx_hash).await;
    assert_eq!(report.status, TrackStatus::Confirmed);
    assert_eq!(report.attempts, 1);
    assert_eq!(report.blob_gas_used, Some(131_072));
    assert!(report.block_number.is_some());
}

#[tokio::test]
async fn tracker_reports_failed_and_timeout() {
    let backend = LocalKeyBackend::from_seed(0x72);
    let rpc = funded_rpc(&backend).with_blob_receipts(ReceiptBehavior::Revert);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));
    h.submitter.submit(example_payload()).await.unwrap_err();
    let reverted = h.rpc.sent()[0].hash;

    let tracker = BlobTxTracker::new(Arc::clone(&h.rpc), policy(4));
    assert_eq!(tracker.track(reverted).await.status, TrackStatus::Failed);

    let unknown = TxHash::repeat_byte(0x99);
    let report = tracker.track(unknown).await;
    assert_eq!(report.status, TrackStatus::Timeout);
    assert_eq!(report.attempts, 4);
    assert_eq!(h.rpc.receipt_polls(unknown), 4);

    let body = serde_json::to_value(&report).unwrap();
    assert_eq!(body["status"], "TIMEOUT");
    assert!(body["blockNumber"].is_null());
}
