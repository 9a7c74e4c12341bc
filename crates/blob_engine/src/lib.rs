//! Blob construction for EIP-4844 submissions
//!
//! - **Encoding**: pack an opaque payload into the 4096 × 32-byte field element
//!   layout, 31 payload bytes per element
//! - **Commitment**: KZG commitment, blob proof and self-check using c-kzg
//!
//! ```text
//! payload ──encode_payload──> Blob ──KzgEngine::commit_verified──> BlobBundle
//!                                                                    ├─ commitment
//!                                                                    ├─ proof
//!                                                                    └─ versioned hash
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use blobcast_blob_engine::{KzgEngine, encode_payload};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let blob = encode_payload(br#"{"example":"data"}"#)?;
//! let bundle = KzgEngine::global().commit_verified(blob)?;
//! println!("versioned hash: {}", bundle.versioned_hash());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Payload packing into the blob field element layout.
pub mod encoder;
/// Error types for the blob engine.
pub mod error;
/// KZG commitment engine and process-wide trusted setup.
pub mod kzg;

pub use encoder::{decode_payload, encode_payload, field_elements_used};
pub use error::{EncodeError, KzgError};
pub use kzg::{KzgEngine, install_trusted_setup};
