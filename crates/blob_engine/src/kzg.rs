//! KZG commitments and proofs for EIP-4844 blobs
//!
//! The engine commits to a blob, computes the blob proof and checks the pair
//! before anything downstream sees it. A proof that fails its own check is a
//! fatal [`KzgError::ProofGeneration`].
//!
//! ## Trusted setup
//!
//! Settings are process-wide, loaded once on first use and read-only after.
//! By default the Ethereum mainnet ceremony output embedded in `c-kzg` is used;
//! [`install_trusted_setup`] swaps in a JSON setup file, provided it runs
//! before the first commitment.

use std::{path::Path, sync::OnceLock};

use alloy_primitives::hex;
use blobcast_types::blob::{Blob, BlobBundle, KzgCommitment, KzgProof};
use c_kzg::{Blob as CKzgBlob, Bytes48, KzgSettings, ethereum_kzg_settings};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::KzgError;

/// Number of bytes per G1 point
const BYTES_PER_G1_POINT: usize = 48;
/// Number of bytes per G2 point
const BYTES_PER_G2_POINT: usize = 96;

/// Disables fixed-base multi-scalar multiplication precomputation
const NO_PRECOMPUTE: u64 = 0;

static SETTINGS: OnceLock<&'static KzgSettings> = OnceLock::new();

/// Wrapper over a BLS G1 point's byte representation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
struct G1Point(#[serde(with = "hex_serde")] [u8; BYTES_PER_G1_POINT]);

/// Wrapper over a BLS G2 point's byte representation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
struct G2Point(#[serde(with = "hex_serde")] [u8; BYTES_PER_G2_POINT]);

/// Trusted setup parameters in the consensus-specs JSON layout
#[derive(Debug, Clone, Deserialize)]
struct TrustedSetup {
    g1_monomial: Vec<G1Point>,
    g1_lagrange: Vec<G1Point>,
    g2_monomial: Vec<G2Point>,
}

impl TrustedSetup {
    fn g1_monomial_bytes(&self) -> Vec<u8> {
        self.g1_monomial.iter().flat_map(|p| p.0).collect()
    }

    fn g1_lagrange_bytes(&self) -> Vec<u8> {
        self.g1_lagrange.iter().flat_map(|p| p.0).collect()
    }

    fn g2_monomial_bytes(&self) -> Vec<u8> {
        self.g2_monomial.iter().flat_map(|p| p.0).collect()
    }
}

/// Hex deserialization helper
mod hex_serde {
    use alloy_primitives::hex;
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
            serde::de::Error::custom(format!("Expected {} bytes, got {}", N, bytes.len()))
        })
    }
}

fn load_trusted_setup_file(path: &Path) -> Result<KzgSettings, KzgError> {
    let bytes = std::fs::read(path).map_err(|e| {
        KzgError::TrustedSetupLoad(format!("Failed to read {}: {e}", path.display()))
    })?;

    let trusted_setup: TrustedSetup = serde_json::from_slice(&bytes)
        .map_err(|e| KzgError::TrustedSetupLoad(format!("Failed to parse trusted setup: {e}")))?;

    KzgSettings::load_trusted_setup(
        &trusted_setup.g1_monomial_bytes(),
        &trusted_setup.g1_lagrange_bytes(),
        &trusted_setup.g2_monomial_bytes(),
        NO_PRECOMPUTE,
    )
    .map_err(|e| KzgError::TrustedSetupLoad(format!("Failed to load KZG settings: {e:?}")))
}

/// Installs a custom trusted setup for the whole process.
///
/// # Errors
///
/// - [`KzgError::TrustedSetupLoad`] if the file cannot be read or parsed.
/// - [`KzgError::AlreadyInitialized`] if settings were already installed or used.
pub fn install_trusted_setup(path: &Path) -> Result<(), KzgError> {
    let settings: &'static KzgSettings = Box::leak(Box::new(load_trusted_setup_file(path)?));
    SETTINGS.set(settings).map_err(|_| KzgError::AlreadyInitialized)?;
    info!(path = %path.display(), "Installed custom KZG trusted setup");
    Ok(())
}

fn settings() -> &'static KzgSettings {
    SETTINGS.get_or_init(|| ethereum_kzg_settings(NO_PRECOMPUTE))
}

/// Handle over the process-wide KZG settings.
#[derive(Clone, Copy)]
pub struct KzgEngine {
    settings: &'static KzgSettings,
}

impl core::fmt::Debug for KzgEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KzgEngine").finish_non_exhaustive()
    }
}

impl Default for KzgEngine {
    fn default() -> Self {
        Self::global()
    }
}

impl KzgEngine {
    /// Returns the engine, initialising the shared settings on first call.
    pub fn global() -> Self {
        Self { settings: settings() }
    }

    /// Computes the commitment and the blob proof.
    pub fn commit(&self, blob: &Blob) -> Result<(KzgCommitment, KzgProof), KzgError> {
        let ckzg_blob = to_ckzg_blob(blob)?;

        let commitment = self
            .settings
            .blob_to_kzg_commitment(&ckzg_blob)
            .map_err(|e| KzgError::Computation(format!("{e:?}")))?;
        let commitment_bytes = commitment.to_bytes();

        let proof = self
            .settings
            .compute_blob_kzg_proof(&ckzg_blob, &commitment_bytes)
            .map_err(|e| KzgError::Computation(format!("{e:?}")))?;

        Ok((
            KzgCommitment::new(commitment_bytes.into_inner()),
            KzgProof::new(proof.to_bytes().into_inner()),
        ))
    }

    /// Verifies a blob against a commitment and proof.
    ///
    /// `Ok(false)` means the proof is well-formed but does not verify.
    pub fn verify(
        &self,
        blob: &Blob,
        commitment: &KzgCommitment,
        proof: &KzgProof,
    ) -> Result<bool, KzgError> {
        let ckzg_blob = to_ckzg_blob(blob)?;

        let commitment = Bytes48::from_bytes(commitment.as_bytes())
            .map_err(|e| KzgError::InvalidCommitment(format!("{e:?}")))?;

        let proof = Bytes48::from_bytes(proof.as_bytes())
            .map_err(|e| KzgError::InvalidProof(format!("{e:?}")))?;

        self.settings
            .verify_blob_kzg_proof(&ckzg_blob, &commitment, &proof)
            .map_err(|e| KzgError::Computation(format!("{e:?}")))
    }

    /// Commits, proves and self-checks, returning a bundle ready for a sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`KzgError::ProofGeneration`] if the proof does not verify.
    pub fn commit_verified(&self, blob: Blob) -> Result<BlobBundle, KzgError> {
        let (commitment, proof) = self.commit(&blob)?;

        if !self.verify(&blob, &commitment, &proof)? {
            return Err(KzgError::ProofGeneration {
                commitment: hex::encode_prefixed(commitment.as_bytes()),
            });
        }

        debug!(
            commitment = %hex::encode_prefixed(commitment.as_bytes()),
            versioned_hash = %commitment.versioned_hash(),
            "Blob commitment verified"
        );
        Ok(BlobBundle::from_verified_parts(blob, commitment, proof))
    }
}

fn to_ckzg_blob(blob: &Blob) -> Result<CKzgBlob, KzgError> {
    CKzgBlob::from_bytes(blob.data()).map_err(|e| KzgError::InvalidBlob(format!("{e:?}")))
}
