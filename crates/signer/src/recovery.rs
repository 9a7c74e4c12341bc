//! Recovery-id search for signatures produced without one.
//!
//! KMS-style backends return only `(r, s)`. Ethereum needs the y-parity as
//! well, and rejects `s` in the upper half of the curve order.

use core::fmt;

use alloy_primitives::{Address, B256, Signature, U256, uint};
use tracing::debug;

use crate::error::RecoveryError;

/// secp256k1 group order `n`.
pub const SECP256K1_ORDER: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

/// `n / 2`, rounded down. Any `s` above this is "high".
pub const SECP256K1_HALF_ORDER: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Returns `n - s` for high `s`, `s` otherwise.
pub fn normalize_s(s: U256) -> U256 {
    if s > SECP256K1_HALF_ORDER { SECP256K1_ORDER - s } else { s }
}

/// A signature whose parity has been matched against the signer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSignature {
    /// `r` as returned by the key service.
    pub r: U256,
    /// The `s` that recovered the signer, low-s whenever that worked.
    pub s: U256,
    /// Parity of the recovered point's y coordinate.
    pub y_parity: bool,
}

impl ResolvedSignature {
    /// Legacy `v`, `27 + parity`.
    pub const fn v(&self) -> u8 {
        27 + self.y_parity as u8
    }

    /// As an alloy [`Signature`].
    pub fn signature(&self) -> Signature {
        Signature::new(self.r, self.s, self.y_parity)
    }
}

impl From<ResolvedSignature> for Signature {
    fn from(resolved: ResolvedSignature) -> Self {
        resolved.signature()
    }
}

/// One `(s, parity)` combination tried during the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryAttempt {
    /// `s` used for this attempt.
    pub s: U256,
    /// `27 + parity`.
    pub v: u8,
    /// The recovered address, or why recovery failed.
    pub outcome: Result<Address, String>,
}

impl fmt::Display for RecoveryAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(address) => write!(f, "v={} s={:#x} -> {address}", self.v, self.s),
            Err(e) => write!(f, "v={} s={:#x} -> error: {e}", self.v, self.s),
        }
    }
}

/// Finds the `(s, parity)` pair under which `(r, s)` recovers `expected`.
///
/// Low-s is tried first with parity 0 then 1, then the original `s` if it
/// differs. The first match wins.
pub fn resolve_recovery_id(
    digest: B256,
    r: U256,
    s: U256,
    expected: Address,
) -> Result<ResolvedSignature, RecoveryError> {
    let s_low = normalize_s(s);
    let candidates: &[U256] = if s_low == s { &[s] } else { &[s_low, s] };

    let mut attempts = Vec::with_capacity(candidates.len() * 2);
    for &candidate in candidates {
        for y_parity in [false, true] {
            let resolved = ResolvedSignature { r, s: candidate, y_parity };
            let outcome = resolved
                .signature()
                .recover_address_from_prehash(&digest)
                .map_err(|e| e.to_string());

            if outcome.as_ref() == Ok(&expected) {
                debug!(v = resolved.v(), normalized = candidate != s, "Resolved recovery id");
                return Ok(resolved);
            }
            attempts.push(RecoveryAttempt { s: candidate, v: resolved.v(), outcome });
        }
    }

    Err(RecoveryError::Exhausted { expected, digest, attempts })
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::{Signature as K256Signature, SigningKey, signature::hazmat::PrehashSigner};

    use super::*;

    fn key_and_address(seed: u8) -> (SigningKey, Address) {
        let key = SigningKey::from_slice(&[seed; 32]).unwrap();
        let address = Address::from_public_key(key.verifying_key());
        (key, address)
    }

    fn sign(key: &SigningKey, digest: B256) -> (U256, U256) {
        let (sig, _): (K256Signature, _) = key.sign_prehash(digest.as_slice()).unwrap();
        (U256::from_be_slice(&sig.r().to_bytes()), U256::from_be_slice(&sig.s().to_bytes()))
    }

    #[test]
    fn half_order_matches_order() {
        assert_eq!(SECP256K1_HALF_ORDER, SECP256K1_ORDER >> 1);
    }

    #[test]
    fn resolves_low_s_signature() {
        let (key, address) = key_and_address(0x21);
        for i in 0u8..16 {
            let digest = B256::repeat_byte(i);
            let (r, s) = sign(&key, digest);
            assert!(s <= SECP256K1_HALF_ORDER);

            let resolved = resolve_recovery_id(digest, r, s, address).unwrap();
            assert_eq!(resolved.s, s);
            assert!(resolved.v() == 27 || resolved.v() == 28);
            assert_eq!(resolved.signature().recover_address_from_prehash(&digest).unwrap(), address);
        }
    }

    #[test]
    fn normalizes_high_s_signature() {
        let (key, address) = key_and_address(0x33);
        let digest = B256::repeat_byte(0x5a);
        let (r, s) = sign(&key, digest);
        let high_s = SECP256K1_ORDER - s;
        assert!(high_s > SECP256K1_HALF_ORDER);

        let resolved = resolve_recovery_id(digest, r, high_s, address).unwrap();
        assert_eq!(resolved.s, s, "high s must come back normalized");
        assert_eq!(resolved.signature().recover_address_from_prehash(&digest).unwrap(), address);
    }

    #[test]
    fn wrong_address_exhausts_all_attempts() {
        let (key, _) = key_and_address(0x44);
        let (_, other) = key_and_address(0x45);
        let digest = B256::repeat_byte(0x01);
        let (r, s) = sign(&key, digest);

        let err = resolve_recovery_id(digest, r, s, other).unwrap_err();
        let RecoveryError::Exhausted { expected, attempts, .. } = err;
        assert_eq!(expected, other);
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts.iter().map(|a| a.v).collect::<Vec<_>>(), vec![27, 28]);
    }

    #[test]
    fn high_s_with_wrong_address_tries_both_variants() {
        let (key, _) = key_and_address(0x55);
        let (_, other) = key_and_address(0x56);
        let digest = B256::repeat_byte(0x02);
        let (r, s) = sign(&key, digest);

        let err = resolve_recovery_id(digest, r, SECP256K1_ORDER - s, other).unwrap_err();
        let RecoveryError::Exhausted { attempts, .. } = err;
        assert_eq!(attempts.len(), 4);
        assert_eq!(attempts[0].s, s);
        assert_eq!(attempts[2].s, SECP256K1_ORDER - s);
    }
}
