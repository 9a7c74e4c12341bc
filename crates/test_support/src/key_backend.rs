//! In-process stand-in for a KMS secp256k1 key.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use blobcast_signer::{KeyBackend, SignerError, recovery::SECP256K1_ORDER};
use k256::{
    ecdsa::{Signature, SigningKey, signature::hazmat::PrehashSigner},
    pkcs8::EncodePublicKey,
};

/// A [`KeyBackend`] backed by a local k256 key.
///
/// Produces the same DER structures as AWS KMS. With `high_s` enabled every
/// signature is returned with `s' = n - s`, which KMS is allowed to do.
pub struct LocalKeyBackend {
    key_id: String,
    key: SigningKey,
    high_s: AtomicBool,
    fail_signing: AtomicBool,
    key_fetches: AtomicUsize,
    sign_calls: AtomicUsize,
    digests: Mutex<Vec<B256>>,
}

impl LocalKeyBackend {
    /// Deterministic key derived from `seed`. `seed` must be non-zero.
    pub fn from_seed(seed: u8) -> Self {
        let key = match SigningKey::from_slice(&[seed; 32]) {
            Ok(key) => key,
            Err(e) => panic!("seed {seed} is not a valid secp256k1 scalar: {e}"),
        };
        Self {
            key_id: format!("local-key-{seed:02x}"),
            key,
            high_s: AtomicBool::new(false),
            fail_signing: AtomicBool::new(false),
            key_fetches: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            digests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_high_s(self) -> Self {
        self.high_s.store(true, Ordering::SeqCst);
        self
    }

    /// Makes every subsequent `Sign` call fail.
    pub fn fail_signing(&self) {
        self.fail_signing.store(true, Ordering::SeqCst);
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(self.key.verifying_key())
    }

    pub fn key_fetches(&self) -> usize {
        self.key_fetches.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// Digests handed to the backend, in order.
    pub fn signed_digests(&self) -> Vec<B256> {
        self.digests.lock().unwrap().clone()
    }

    fn flip_s(sig: Signature) -> Signature {
        let s = U256::from_be_slice(&sig.s().to_bytes());
        let high = SECP256K1_ORDER - s;
        Signature::from_scalars(sig.r().to_bytes(), high.to_be_bytes::<32>())
            .unwrap_or(sig)
    }
}

#[async_trait]
impl KeyBackend for LocalKeyBackend {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn public_key_der(&self) -> Result<Vec<u8>, SignerError> {
        self.key_fetches.fetch_add(1, Ordering::SeqCst);
        self.key
            .verifying_key()
            .to_public_key_der()
            .map(|doc| doc.into_vec())
            .map_err(|e| SignerError::key_resolution(&self.key_id, e))
    }

    async fn sign_digest_der(&self, digest: B256) -> Result<Vec<u8>, SignerError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.digests.lock().unwrap().push(digest);

        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(SignerError::signing(&self.key_id, "signing disabled for this test"));
        }

        let sig: Signature = self
            .key
            .sign_prehash(digest.as_slice())
            .map_err(|e| SignerError::signing(&self.key_id, e))?;
        // k256 always returns low-s.
        let sig = if self.high_s.load(Ordering::SeqCst) { Self::flip_s(sig) } else { sig };
        Ok(sig.to_der().as_bytes().to_vec())
    }
}
