use std::sync::Arc;

use alloy_primitives::B256;
use async_trait::async_trait;

use crate::error::SignerError;

/// A non-exportable secp256k1 key held by a remote service.
///
/// The backend only moves bytes: parsing and recovery happen in
/// [`RemoteSigner`](crate::RemoteSigner), so an HSM or another cloud KMS can
/// slot in by implementing these three methods.
#[async_trait]
pub trait KeyBackend: Send + Sync {
    /// Identifier of the key, used in logs and error messages.
    fn key_id(&self) -> &str;

    /// DER-encoded SubjectPublicKeyInfo of the key.
    async fn public_key_der(&self) -> Result<Vec<u8>, SignerError>;

    /// DER-encoded ECDSA signature over a 32-byte digest. The backend must
    /// not hash the digest again.
    async fn sign_digest_der(&self, digest: B256) -> Result<Vec<u8>, SignerError>;
}

#[async_trait]
impl<T: KeyBackend + ?Sized> KeyBackend for Arc<T> {
    fn key_id(&self) -> &str {
        (**self).key_id()
    }

    async fn public_key_der(&self) -> Result<Vec<u8>, SignerError> {
        (**self).public_key_der().await
    }

    async fn sign_digest_der(&self, digest: B256) -> Result<Vec<u8>, SignerError> {
        (**self).sign_digest_der(digest).await
    }
}
