//! Live checks against AWS KMS and a real node.
//!
//! Needs `KMS_KEY_ID`, `AWS_REGION` and AWS credentials in the environment.

use blobcast_signer::{AwsKmsBackend, RemoteSigner};
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore = "live test - run with: cargo test -p blobcast-test --test live_kms -- --ignored"]
async fn kms_key_signs_recoverable_digests() -> color_eyre::Result<()> {
    let key_id = std::env::var("KMS_KEY_ID")?;
    let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());

    let signer = RemoteSigner::new(AwsKmsBackend::connect(region, key_id).await);
    let address = signer.resolve_address().await?;

    let digest = alloy_primitives::keccak256(b"blobcast live check");
    let signature = signer.sign_prehash(digest).await?;
    assert_eq!(signature.recover_address_from_prehash(&digest)?, address);
    Ok(())
}
