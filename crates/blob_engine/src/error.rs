//! Error types for blob encoding and KZG operations
use blobcast_types::blob::InvalidLength;
use thiserror::Error;

/// Errors raised while packing a payload into a blob
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Payload does not fit into a single blob
    #[error("payload of {size} bytes exceeds blob capacity of {capacity} bytes")]
    CapacityExceeded {
        /// Payload length.
        size: usize,
        /// Usable bytes per blob.
        capacity: usize,
    },

    /// Internal buffer had the wrong length
    #[error(transparent)]
    Length(#[from] InvalidLength),
}

/// Errors that can occur during KZG commitment, proof and verification
#[derive(Debug, Error)]
pub enum KzgError {
    /// Failed to load the trusted setup file
    #[error("Failed to load trusted setup: {0}")]
    TrustedSetupLoad(String),

    /// A trusted setup was installed after the process-wide settings were already in use
    #[error("KZG settings already initialized; install the trusted setup before first use")]
    AlreadyInitialized,

    /// Invalid blob data format
    #[error("Invalid blob data: {0}")]
    InvalidBlob(String),

    /// Invalid KZG commitment format
    #[error("Invalid KZG commitment: {0}")]
    InvalidCommitment(String),

    /// Invalid KZG proof format
    #[error("Invalid KZG proof: {0}")]
    InvalidProof(String),

    /// The KZG library returned an error while committing or proving
    #[error("KZG computation failed: {0}")]
    Computation(String),

    /// The freshly computed proof did not verify against its own commitment
    ///
    /// Points at an environment or library defect, never retried.
    #[error("KZG self-check failed: proof does not verify for commitment {commitment}")]
    ProofGeneration {
        /// Hex-encoded commitment that failed the check.
        commitment: String,
    },
}
