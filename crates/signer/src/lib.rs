//! Remote secp256k1 signing for Ethereum transactions.
//!
//! A [`KeyBackend`] holds a key that never leaves its service and returns DER:
//! a SubjectPublicKeyInfo for the public key and an `ECDSA-Sig-Value` for each
//! signature. [`RemoteSigner`] turns that into an Ethereum address and
//! recoverable low-s signatures.

#![forbid(unsafe_code)]

mod aws;
mod backend;
pub mod der;
mod error;
pub mod recovery;
mod remote;

pub use aws::AwsKmsBackend;
pub use backend::KeyBackend;
pub use error::{RecoveryError, SignerError};
pub use recovery::{ResolvedSignature, resolve_recovery_id};
pub use remote::{RemoteSigner, address_from_spki};
