//! AWS KMS key backend.

use alloy_primitives::B256;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, meta::region::RegionProviderChain};
use aws_sdk_kms::{
    Client,
    error::DisplayErrorContext,
    primitives::Blob,
    types::{KeySpec, MessageType, SigningAlgorithmSpec},
};
use tracing::{debug, trace};

use crate::{backend::KeyBackend, error::SignerError};

/// An `ECC_SECG_P256K1` key in AWS KMS.
#[derive(Debug, Clone)]
pub struct AwsKmsBackend {
    client: Client,
    key_id: String,
}

impl AwsKmsBackend {
    /// Builds a client for `region`, with credentials from the default chain.
    pub async fn connect(region: impl Into<String>, key_id: impl Into<String>) -> Self {
        let region_provider =
            RegionProviderChain::first_try(Some(Region::new(region.into()))).or_default_provider();
        let config = aws_config::defaults(BehaviorVersion::latest()).region(region_provider).load().await;
        Self::with_client(Client::new(&config), key_id)
    }

    pub fn with_client(client: Client, key_id: impl Into<String>) -> Self {
        Self { client, key_id: key_id.into() }
    }
}

#[async_trait]
impl KeyBackend for AwsKmsBackend {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn public_key_der(&self) -> Result<Vec<u8>, SignerError> {
        let response = self
            .client
            .get_public_key()
            .key_id(&self.key_id)
            .send()
            .await
            .map_err(|e| SignerError::key_resolution(&self.key_id, DisplayErrorContext(&e)))?;

        if let Some(spec) = response.key_spec()
            && *spec != KeySpec::EccSecgP256K1
        {
            return Err(SignerError::key_resolution(
                &self.key_id,
                format!("unsupported key spec {}", spec.as_str()),
            ));
        }

        let der = response
            .public_key
            .ok_or_else(|| SignerError::key_resolution(&self.key_id, "response has no public key"))?
            .into_inner();
        debug!(key_id = %self.key_id, len = der.len(), "Fetched KMS public key");
        Ok(der)
    }

    async fn sign_digest_der(&self, digest: B256) -> Result<Vec<u8>, SignerError> {
        trace!(key_id = %self.key_id, %digest, "Requesting KMS signature");
        let response = self
            .client
            .sign()
            .key_id(&self.key_id)
            .message(Blob::new(digest.to_vec()))
            .message_type(MessageType::Digest)
            .signing_algorithm(SigningAlgorithmSpec::EcdsaSha256)
            .send()
            .await
            .map_err(|e| SignerError::signing(&self.key_id, DisplayErrorContext(&e)))?;

        response
            .signature
            .map(Blob::into_inner)
            .ok_or_else(|| SignerError::signing(&self.key_id, "response has no signature"))
    }
}
