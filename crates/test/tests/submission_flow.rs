//! End-to-end submission pipeline against a local key and an in-memory node.

mod common;

use alloy_consensus::{Transaction, transaction::SignerRecoverable};
use alloy_primitives::{Address, TxHash, U256};
use blobcast_execution::BroadcastError;
use blobcast_node::PipelineError;
use blobcast_test_support::{LocalKeyBackend, MockEthRpc, ReceiptBehavior};
use blobcast_types::{
    blob::BLOB_DATA_CAPACITY,
    payload::Payload,
    submission::{FundingMode, SubmissionStage},
};
use common::{
    EXAMPLE_PAYLOAD, Harness, example_payload, fast_config, funded_rpc, is_versioned_hash,
    one_ether,
};

#[tokio::test]
async fn example_payload_is_funded_and_confirmed() {
    let h = Harness::funded(FundingMode::Ephemeral);
    let signer = h.backend.address();

    let response = h.submitter.submit(example_payload()).await.unwrap();

    assert!(response.success);
    assert!(is_versioned_hash(&response.blob_hash), "{}", response.blob_hash);
    assert_eq!(response.data_size, EXAMPLE_PAYLOAD.len());
    assert_eq!(response.signer_address, signer.to_string());
    assert_eq!(response.kms_key_id, "local-key-42");
    assert!(response.block_number.is_some());
    assert_eq!(response.gas_used.as_deref(), Some("21000"));
    assert_eq!(response.blob_gas_used.as_deref(), Some("131072"));
    assert_eq!(
        response.etherscan_blob_url,
        format!("https://sepolia.etherscan.io/tx/{}", response.blob_transaction_hash)
    );
    assert_eq!(
        response.blob_url,
        format!("https://sepolia.blobscan.com/blob/{}", response.blob_hash)
    );

    let sent = h.rpc.sent();
    assert_eq!(sent.len(), 2);
    let (funding, blob) = (&sent[0], &sent[1]);

    // The KMS key signs exactly once: the funding transfer.
    assert_eq!(h.backend.sign_calls(), 1);
    assert_eq!(funding.from, signer);
    assert_eq!(funding.envelope.to(), Some(blob.from));
    assert_eq!(Some(funding.hash.to_string()), response.eth_transfer_hash);
    // The ephemeral account receives exactly what the blob tx can cost and
    // is left with nothing.
    assert_eq!(funding.envelope.value(), blob.max_cost());
    assert_eq!(h.rpc.balance_of(blob.from), U256::ZERO);

    assert!(blob.is_blob());
    assert_ne!(blob.from, signer);
    assert_eq!(blob.envelope.nonce(), 0);
    assert_eq!(blob.envelope.to(), Some(signer));
    assert_eq!(blob.envelope.value(), U256::ZERO);
    assert_eq!(blob.hash.to_string(), response.blob_transaction_hash);
    let hashes = blob.envelope.blob_versioned_hashes().unwrap();
    assert_eq!(hashes.len(), 1);
    assert_eq!(hashes[0].to_string(), response.blob_hash);

    let snapshot = h.submitter.metrics().snapshot();
    assert_eq!((snapshot.started, snapshot.succeeded, snapshot.failed), (1, 1, 0));
    assert_eq!(h.submitter.metrics().stage_count(SubmissionStage::Confirmed), 1);
}

#[tokio::test]
async fn direct_mode_signs_the_blob_tx_with_the_kms_key() {
    let backend = LocalKeyBackend::from_seed(0x43);
    let signer = backend.address();
    let rpc = funded_rpc(&backend).with_nonce(signer, 5);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));

    let response = h.submitter.submit(example_payload()).await.unwrap();

    assert_eq!(response.eth_transfer_hash, None);
    assert_eq!(response.etherscan_transfer_url, None);
    let sent = h.rpc.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_blob());
    assert_eq!(sent[0].from, signer);
    assert_eq!(sent[0].envelope.nonce(), 5);
    assert_eq!(h.backend.sign_calls(), 1);
    assert_eq!(h.submitter.metrics().stage_count(SubmissionStage::Funded), 0);
}

#[tokio::test]
async fn high_s_signatures_still_recover_to_the_signer() {
    let backend = LocalKeyBackend::from_seed(0x44).with_high_s();
    let signer = backend.address();
    let rpc = funded_rpc(&backend);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));

    h.submitter.submit(example_payload()).await.unwrap();

    let sent = h.rpc.sent();
    assert_eq!(sent[0].envelope.recover_signer().unwrap(), signer);
    let signature = sent[0].envelope.signature();
    assert!(signature.s() <= blobcast_signer::recovery::SECP256K1_HALF_ORDER);
}

#[tokio::test]
async fn zero_balance_is_rejected_before_signing() {
    let backend = LocalKeyBackend::from_seed(0x45);
    let h = Harness::new(backend, MockEthRpc::default(), fast_config(FundingMode::Ephemeral));

    let err = h.submitter.submit(example_payload()).await.unwrap_err();

    assert!(matches!(err, PipelineError::InsufficientBalance { balance, .. } if balance.is_zero()));
    assert_eq!(err.status_code(), 400);
    let body = err.to_response();
    assert_eq!(body.balance.as_deref(), Some("0"));
    assert!(body.required.is_some());

    assert_eq!(h.backend.sign_calls(), 0);
    assert!(h.rpc.sent().is_empty());
    assert_eq!(h.submitter.metrics().snapshot().failed, 1);
    assert_eq!(h.submitter.metrics().stage_count(SubmissionStage::Failed), 1);
}

#[tokio::test]
async fn balance_equal_to_the_requirement_is_not_enough() {
    // Learn the requirement from a rejected attempt, then fund exactly that much.
    let backend = LocalKeyBackend::from_seed(0x46);
    let signer = backend.address();
    let probe = Harness::new(backend, MockEthRpc::default(), fast_config(FundingMode::Direct));
    let PipelineError::InsufficientBalance { required, .. } =
        probe.submitter.submit(example_payload()).await.unwrap_err()
    else {
        panic!("expected a balance error");
    };

    let backend = LocalKeyBackend::from_seed(0x46);
    let rpc = MockEthRpc::default().with_balance(signer, required);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));
    assert!(matches!(
        h.submitter.submit(example_payload()).await,
        Err(PipelineError::InsufficientBalance { .. })
    ));

    let backend = LocalKeyBackend::from_seed(0x46);
    let rpc = MockEthRpc::default().with_balance(signer, required + U256::from(1));
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));
    assert!(h.submitter.submit(example_payload()).await.is_ok());
}

#[tokio::test]
async fn funding_timeout_aborts_before_the_blob_tx_is_sent() {
    let backend = LocalKeyBackend::from_seed(0x47);
    let rpc = funded_rpc(&backend).with_funding_receipts(ReceiptBehavior::Never);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Ephemeral));

    let err = h.submitter.submit(example_payload()).await.unwrap_err();

    let PipelineError::FundingTimeout { tx_hash, attempts } = err else {
        panic!("expected funding timeout, got {err}");
    };
    assert_eq!(attempts, 3);
    assert_eq!(h.rpc.receipt_polls(tx_hash), 3);
    assert_eq!(h.rpc.sent().len(), 1);
    assert!(h.rpc.sent_blob_txs().is_empty());
}

#[tokio::test]
async fn reverted_funding_transfer_is_an_error() {
    let backend = LocalKeyBackend::from_seed(0x48);
    let rpc = funded_rpc(&backend).with_funding_receipts(ReceiptBehavior::Revert);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Ephemeral));

    let err = h.submitter.submit(example_payload()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Reverted { stage: "funding", .. }));
    assert!(h.rpc.sent_blob_txs().is_empty());
}

#[tokio::test]
async fn unconfirmed_blob_tx_still_reports_success() {
    let backend = LocalKeyBackend::from_seed(0x49);
    let rpc = funded_rpc(&backend).with_blob_receipts(ReceiptBehavior::Never);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Ephemeral));

    let response = h.submitter.submit(example_payload()).await.unwrap();

    assert!(response.success);
    assert_eq!(response.block_number, None);
    assert_eq!(response.gas_used, None);
    assert_eq!(response.blob_gas_used, None);
    assert_eq!(h.rpc.sent_blob_txs().len(), 1);
    assert_eq!(h.submitter.metrics().stage_count(SubmissionStage::TimedOut), 1);
}

#[tokio::test]
async fn slow_receipts_are_awaited() {
    let backend = LocalKeyBackend::from_seed(0x4a);
    let rpc = funded_rpc(&backend)
        .with_funding_receipts(ReceiptBehavior::Confirm { after_polls: 3 })
        .with_blob_receipts(ReceiptBehavior::Confirm { after_polls: 2 });
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Ephemeral));

    let response = h.submitter.submit(example_payload()).await.unwrap();
    assert!(response.block_number.is_some());

    let blob_hash: TxHash = response.blob_transaction_hash.parse().unwrap();
    assert_eq!(h.rpc.receipt_polls(blob_hash), 2);
}

#[tokio::test]
async fn reverted_blob_tx_is_an_error() {
    let backend = LocalKeyBackend::from_seed(0x4b);
    let rpc = funded_rpc(&backend).with_blob_receipts(ReceiptBehavior::Revert);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));

    let err = h.submitter.submit(example_payload()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Reverted { stage: "blob", .. }));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn blob_failure_after_funding_keeps_the_transfer_hash() {
    let backend = LocalKeyBackend::from_seed(0x4e);
    let rpc = funded_rpc(&backend).with_blob_receipts(ReceiptBehavior::Revert);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Ephemeral));

    let err = h.submitter.submit(example_payload()).await.unwrap_err();
    let funding = h.rpc.sent()[0].clone();
    assert!(!funding.is_blob());

    let PipelineError::AfterFunding { transfer_hash, source } = &err else {
        panic!("expected a post-funding failure, got {err:?}");
    };
    assert_eq!(*transfer_hash, funding.hash);
    assert!(matches!(**source, PipelineError::Reverted { stage: "blob", .. }));
    assert_eq!(err.status_code(), 500);

    let response = err.to_response();
    assert_eq!(response.error, "Transaction reverted");
    assert_eq!(response.eth_transfer_hash, Some(funding.hash.to_string()));
}

#[tokio::test]
async fn broadcast_rejections_are_classified() {
    let backend = LocalKeyBackend::from_seed(0x4c);
    let rpc = funded_rpc(&backend).with_broadcast_error("replacement transaction underpriced");
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));

    let err = h.submitter.submit(example_payload()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Broadcast { stage: "blob", source: BroadcastError::NonceConflict(_) }
    ));
    assert_eq!(err.status_code(), 500);
    assert!(err.to_response().details.unwrap().contains("underpriced"));
}

#[tokio::test]
async fn locally_computed_hash_wins_over_the_reported_one() {
    let backend = LocalKeyBackend::from_seed(0x4d);
    let rpc = funded_rpc(&backend).with_reported_hash(TxHash::repeat_byte(0xee));
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));

    let response = h.submitter.submit(example_payload()).await.unwrap();
    assert_eq!(response.blob_transaction_hash, h.rpc.sent()[0].hash.to_string());
    assert!(response.block_number.is_some());
}

#[tokio::test]
async fn missing_base_fee_fails_before_signing() {
    let backend = LocalKeyBackend::from_seed(0x4e);
    let rpc = funded_rpc(&backend).with_base_fee(None);
    let h = Harness::new(backend, rpc, fast_config(FundingMode::Direct));

    let err = h.submitter.submit(example_payload()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Rpc(_)));
    assert_eq!(h.backend.sign_calls(), 0);
}

#[tokio::test]
async fn priority_fee_falls_back_to_the_configured_default() {
    let backend = LocalKeyBackend::from_seed(0x4f);
    let rpc = funded_rpc(&backend).with_priority_fee(None);
    let config = fast_config(FundingMode::Direct);
    let default_tip = config.default_priority_fee;
    let h = Harness::new(backend, rpc, config);

    h.submitter.submit(example_payload()).await.unwrap();
    assert_eq!(h.rpc.sent()[0].envelope.max_priority_fee_per_gas(), Some(default_tip));
}

#[tokio::test]
async fn payload_at_capacity_is_accepted_and_one_byte_more_is_not() {
    let h = Harness::funded(FundingMode::Direct);

    let full = Payload::new(vec![0x5a; BLOB_DATA_CAPACITY]).unwrap();
    assert!(h.submitter.submit(full).await.is_ok());

    let over = Payload::new(vec![0x5a; BLOB_DATA_CAPACITY + 1]).unwrap();
    let err = h.submitter.submit(over).await.unwrap_err();
    assert!(matches!(err, PipelineError::Encode(_)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(h.rpc.sent().len(), 1);
}

#[tokio::test]
async fn signer_address_is_resolved_once_across_submissions() {
    let h = Harness::funded(FundingMode::Direct);
    h.submitter.submit(example_payload()).await.unwrap();
    h.submitter.submit(example_payload()).await.unwrap();

    assert_eq!(h.backend.key_fetches(), 1);
    assert_eq!(h.rpc.sent().len(), 2);
    assert_eq!(h.rpc.balance_of(Address::ZERO), U256::ZERO);
    assert_eq!(h.rpc.balance_of(h.backend.address()), one_ether());
}
