//! EIP-4844 Blob Types
//!
//! Core data structures for a single blob submission. A blob is a fixed-size
//! (131,072 byte) buffer committed to via KZG and carried as a sidecar next to
//! a type-3 transaction.
//!
//! ```text
//! Payload (<= 126,976 bytes)
//!     │ encode (31 bytes per field element, leading zero byte)
//!     ▼
//! Blob (131,072 bytes = 4096 × 32)
//!     │ commit + prove
//!     ├──> KzgCommitment (48 bytes) ──sha256──> versioned hash (0x01 ‖ …)
//!     └──> KzgProof      (48 bytes)
//! ```
//!
//! ## References
//!
//! - EIP-4844: <https://eips.ethereum.org/EIPS/eip-4844>
//! - Polynomial commitments: <https://github.com/ethereum/consensus-specs/blob/dev/specs/deneb/polynomial-commitments.md>

// Re-export so other crates can depend on blobcast_types instead of alloy directly.
pub use alloy_eips::eip4844::kzg_to_versioned_hash;
use alloy_eips::eip4844::{
    Blob as AlloyBlob, BlobTransactionSidecar, Bytes48, VERSIONED_HASH_VERSION_KZG,
};
use serde::{Deserialize, Serialize};

use crate::aliases::{B256, Bytes};

/// The number of bytes in a single blob.
///
/// 4096 field elements of 32 bytes each in the BLS12-381 scalar field.
/// **Do NOT change this value** - it's part of the Ethereum consensus protocol.
pub const BYTES_PER_BLOB: usize = 131_072;

/// Number of field elements in a blob.
pub const FIELD_ELEMENTS_PER_BLOB: usize = 4096;

/// Serialized width of one field element.
pub const BYTES_PER_FIELD_ELEMENT: usize = 32;

/// Payload bytes carried by one field element.
///
/// The first byte of every element stays zero so the 32-byte big-endian value
/// is always below the BLS12-381 scalar field modulus.
pub const USABLE_BYTES_PER_FIELD_ELEMENT: usize = 31;

/// Maximum payload that fits into one blob (126,976 bytes).
pub const BLOB_DATA_CAPACITY: usize = FIELD_ELEMENTS_PER_BLOB * USABLE_BYTES_PER_FIELD_ELEMENT;

/// The size of a KZG commitment in bytes (compressed BLS12-381 G1 point).
pub const BYTES_PER_COMMITMENT: usize = 48;

/// The size of a KZG proof in bytes (compressed BLS12-381 G1 point).
pub const BYTES_PER_PROOF: usize = 48;

/// Error returned when a byte buffer does not have the length its type requires.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} size: expected {expected} bytes, got {actual}")]
pub struct InvalidLength {
    /// Which type was being built.
    pub kind: &'static str,
    /// Required length.
    pub expected: usize,
    /// Length that was supplied.
    pub actual: usize,
}

/// A single blob.
///
/// **Invariant**: `data` is exactly `BYTES_PER_BLOB` bytes. The constructor
/// enforces this; nothing mutates the buffer afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    data: Bytes,
}

impl Blob {
    /// Creates a new blob from the given data.
    ///
    /// ## Errors
    ///
    /// Returns [`InvalidLength`] if `data.len() != BYTES_PER_BLOB`.
    pub fn new(data: Bytes) -> Result<Self, InvalidLength> {
        if data.len() != BYTES_PER_BLOB {
            return Err(InvalidLength {
                kind: "blob",
                expected: BYTES_PER_BLOB,
                actual: data.len(),
            });
        }

        Ok(Self { data })
    }

    /// Returns a reference to the blob data.
    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the size of the blob in bytes.
    ///
    /// Always `BYTES_PER_BLOB` due to the constructor invariant.
    #[inline]
    pub const fn size(&self) -> usize {
        BYTES_PER_BLOB
    }

    /// Returns the 32-byte field element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= FIELD_ELEMENTS_PER_BLOB`.
    #[inline]
    pub fn field_element(&self, index: usize) -> &[u8] {
        let start = index * BYTES_PER_FIELD_ELEMENT;
        &self.data[start..start + BYTES_PER_FIELD_ELEMENT]
    }

    /// Consumes the blob and returns the underlying data.
    #[inline]
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

/// A KZG commitment to a blob.
///
/// **Note**: This does NOT validate that the bytes represent a valid curve point.
/// `c-kzg` validates the point when it is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KzgCommitment(pub [u8; BYTES_PER_COMMITMENT]);

impl KzgCommitment {
    /// Creates a new KZG commitment from a 48-byte array.
    #[inline]
    pub const fn new(bytes: [u8; BYTES_PER_COMMITMENT]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; BYTES_PER_COMMITMENT] {
        &self.0
    }

    /// Creates a commitment from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvalidLength> {
        <[u8; BYTES_PER_COMMITMENT]>::try_from(bytes).map(Self).map_err(|_| InvalidLength {
            kind: "commitment",
            expected: BYTES_PER_COMMITMENT,
            actual: bytes.len(),
        })
    }

    /// Computes the EIP-4844 versioned hash: `0x01 ‖ sha256(commitment)[1..]`.
    pub fn versioned_hash(&self) -> B256 {
        let hash = kzg_to_versioned_hash(&self.0);
        debug_assert_eq!(hash[0], VERSIONED_HASH_VERSION_KZG);
        hash
    }
}

/// A KZG proof that a blob matches its commitment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KzgProof(pub [u8; BYTES_PER_PROOF]);

impl KzgProof {
    /// Creates a new KZG proof from a 48-byte array.
    #[inline]
    pub const fn new(bytes: [u8; BYTES_PER_PROOF]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; BYTES_PER_PROOF] {
        &self.0
    }

    /// Creates a proof from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvalidLength> {
        <[u8; BYTES_PER_PROOF]>::try_from(bytes).map(Self).map_err(|_| InvalidLength {
            kind: "proof",
            expected: BYTES_PER_PROOF,
            actual: bytes.len(),
        })
    }
}

/// A blob together with its self-checked commitment and proof.
///
/// Only the KZG engine builds these, after `verify(blob, commitment, proof)`
/// returned true. The pipeline treats a bundle as proof that the sidecar is
/// consistent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobBundle {
    blob: Blob,
    commitment: KzgCommitment,
    proof: KzgProof,
}

impl BlobBundle {
    /// Assembles a bundle. Callers must have verified the proof.
    pub fn from_verified_parts(blob: Blob, commitment: KzgCommitment, proof: KzgProof) -> Self {
        Self { blob, commitment, proof }
    }

    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    pub fn commitment(&self) -> &KzgCommitment {
        &self.commitment
    }

    pub fn proof(&self) -> &KzgProof {
        &self.proof
    }

    /// Versioned hash that goes into the transaction's `blob_versioned_hashes`.
    pub fn versioned_hash(&self) -> B256 {
        self.commitment.versioned_hash()
    }

    /// Builds the network-form sidecar (blob, commitment, proof) for broadcast.
    pub fn to_sidecar(&self) -> BlobTransactionSidecar {
        BlobTransactionSidecar::new(
            vec![AlloyBlob::from_slice(self.blob.data())],
            vec![Bytes48::from(self.commitment.0)],
            vec![Bytes48::from(self.proof.0)],
        )
    }
}
