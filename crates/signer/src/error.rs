use alloy_primitives::{Address, B256};
use itertools::Itertools;
use thiserror::Error;

use crate::{der::DerError, recovery::RecoveryAttempt};

/// Failure of the remote signer.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The public key could not be fetched or is not a secp256k1 key.
    #[error("failed to resolve public key for {key_id}: {reason}")]
    KeyResolution { key_id: String, reason: String },

    /// The key service refused to sign or returned a malformed signature.
    #[error("signing request for {key_id} failed: {reason}")]
    Signing { key_id: String, reason: String },

    /// No recovery id maps the signature back to the signer.
    #[error(transparent)]
    Recovery(#[from] RecoveryError),
}

impl SignerError {
    /// [`SignerError::KeyResolution`] for `key_id`.
    pub fn key_resolution(key_id: &str, reason: impl ToString) -> Self {
        Self::KeyResolution { key_id: key_id.to_string(), reason: reason.to_string() }
    }

    /// [`SignerError::Signing`] for `key_id`.
    pub fn signing(key_id: &str, reason: impl ToString) -> Self {
        Self::Signing { key_id: key_id.to_string(), reason: reason.to_string() }
    }

    pub(crate) fn malformed_signature(key_id: &str, err: DerError) -> Self {
        Self::signing(key_id, format!("malformed DER signature: {err}"))
    }
}

/// The recovery-id search came up empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    /// Every `(s, parity)` combination recovered someone else.
    #[error(
        "no recovery id recovers {expected} for digest {digest}; tried [{}]",
        .attempts.iter().join("; ")
    )]
    Exhausted { expected: Address, digest: B256, attempts: Vec<RecoveryAttempt> },
}
