use alloy_primitives::{Address, B256, Signature, U256, keccak256};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{
    backend::KeyBackend,
    der::{self, DerError},
    error::SignerError,
    recovery::resolve_recovery_id,
};

/// Ethereum signer over a [`KeyBackend`].
///
/// The address is derived from the backend's public key on first use and
/// cached for the lifetime of the signer.
#[derive(Debug)]
pub struct RemoteSigner<B> {
    backend: B,
    address: OnceCell<Address>,
}

impl<B: KeyBackend> RemoteSigner<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, address: OnceCell::new() }
    }

    pub fn key_id(&self) -> &str {
        self.backend.key_id()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Address resolved so far, if any.
    pub fn cached_address(&self) -> Option<Address> {
        self.address.get().copied()
    }

    /// Ethereum address of the remote key.
    pub async fn resolve_address(&self) -> Result<Address, SignerError> {
        self.address
            .get_or_try_init(|| async {
                let der = self.backend.public_key_der().await?;
                let address = address_from_spki(&der)
                    .map_err(|e| SignerError::key_resolution(self.key_id(), e))?;
                info!(key_id = %self.key_id(), %address, "Resolved signer address");
                Ok(address)
            })
            .await
            .copied()
    }

    /// Raw `(r, s)` over `digest`, exactly as the backend produced them.
    pub async fn sign_digest(&self, digest: B256) -> Result<(U256, U256), SignerError> {
        let der = self.backend.sign_digest_der(digest).await?;
        der::parse_signature(&der).map_err(|e| SignerError::malformed_signature(self.key_id(), e))
    }

    /// Signs `digest` and returns a recoverable, low-s signature.
    pub async fn sign_prehash(&self, digest: B256) -> Result<Signature, SignerError> {
        let address = self.resolve_address().await?;
        let (r, s) = self.sign_digest(digest).await?;
        let resolved = resolve_recovery_id(digest, r, s, address)?;
        debug!(%digest, v = resolved.v(), "Remote signature resolved");
        Ok(resolved.signature())
    }
}

/// Derives the Ethereum address from a SubjectPublicKeyInfo.
pub fn address_from_spki(der: &[u8]) -> Result<Address, DerError> {
    let point = der::parse_public_key(der)?;
    if k256::PublicKey::from_sec1_bytes(&point).is_err() {
        return Err(DerError::InvalidPoint);
    }
    Ok(Address::from_slice(&keccak256(&point[1..])[12..]))
}
