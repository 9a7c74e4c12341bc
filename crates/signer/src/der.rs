//! Minimal DER walker for the two structures a KMS hands back.
//!
//! ```text
//! ECDSA-Sig-Value ::= SEQUENCE { r INTEGER, s INTEGER }
//!
//! SubjectPublicKeyInfo ::= SEQUENCE {
//!     algorithm        SEQUENCE { id-ecPublicKey OID, secp256k1 OID },
//!     subjectPublicKey BIT STRING (0x00 ‖ 0x04 ‖ X ‖ Y)
//! }
//! ```
//!
//! Every read is bounds checked and anything unexpected (tag, length form,
//! trailing bytes) fails closed.

use alloy_primitives::U256;
use thiserror::Error;

use crate::recovery::SECP256K1_ORDER;

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

/// 1.2.840.10045.2.1
const OID_EC_PUBLIC_KEY: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
/// 1.3.132.0.10
const OID_SECP256K1: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x0a];

/// Length of an uncompressed SEC1 point: `0x04 ‖ X ‖ Y`.
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Why a DER structure was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerError {
    /// A different tag than the structure requires.
    #[error("expected tag 0x{expected:02x} at offset {offset}, found 0x{found:02x}")]
    UnexpectedTag { expected: u8, found: u8, offset: usize },

    /// A length runs past the end of the input.
    #[error("input truncated at offset {offset}")]
    Truncated { offset: usize },

    /// Indefinite or over-long length form.
    #[error("unsupported length encoding at offset {offset}")]
    UnsupportedLength { offset: usize },

    /// Bytes left over after the outer SEQUENCE.
    #[error("{0} trailing bytes after structure")]
    TrailingBytes(usize),

    /// Zero-length or negative INTEGER.
    #[error("INTEGER is empty or negative")]
    InvalidInteger,

    /// More than 32 significant bytes.
    #[error("INTEGER does not fit in 256 bits")]
    IntegerTooLarge,

    /// `r` or `s` outside `[1, n)`.
    #[error("signature scalar is zero or not below the curve order")]
    ScalarOutOfRange,

    /// Algorithm OID other than id-ecPublicKey.
    #[error("public key algorithm is not id-ecPublicKey")]
    UnsupportedAlgorithm,

    /// Curve OID other than secp256k1.
    #[error("public key curve is not secp256k1")]
    UnsupportedCurve,

    /// Compressed, hybrid or wrongly sized point.
    #[error("public key is not an uncompressed 65-byte point")]
    InvalidPoint,
}

struct DerReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Offset of `buf` within the outermost input, for error messages.
    base: usize,
}

impl<'a> DerReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, base: 0 }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn byte(&mut self) -> Result<u8, DerError> {
        let b = *self.buf.get(self.pos).ok_or(DerError::Truncated { offset: self.offset() })?;
        self.pos += 1;
        Ok(b)
    }

    fn length(&mut self) -> Result<usize, DerError> {
        let offset = self.offset();
        let first = self.byte()?;
        match first {
            0x00..=0x7f => Ok(first as usize),
            0x81 => match self.byte()? {
                n @ 0x80..=0xff => Ok(n as usize),
                _ => Err(DerError::UnsupportedLength { offset }),
            },
            0x82 => {
                let n = ((self.byte()? as usize) << 8) | self.byte()? as usize;
                if n < 0x100 {
                    return Err(DerError::UnsupportedLength { offset });
                }
                Ok(n)
            }
            _ => Err(DerError::UnsupportedLength { offset }),
        }
    }

    /// Reads one TLV with the given tag and returns a reader over its contents.
    fn element(&mut self, tag: u8) -> Result<DerReader<'a>, DerError> {
        let offset = self.offset();
        let found = self.byte()?;
        if found != tag {
            return Err(DerError::UnexpectedTag { expected: tag, found, offset });
        }
        let len = self.length()?;
        let start = self.pos;
        let end = start.checked_add(len).filter(|end| *end <= self.buf.len()).ok_or(
            DerError::Truncated { offset: self.base + self.buf.len() },
        )?;
        self.pos = end;
        Ok(DerReader { buf: &self.buf[start..end], pos: 0, base: self.base + start })
    }

    fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn finish(&self) -> Result<(), DerError> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            n => Err(DerError::TrailingBytes(n)),
        }
    }

    fn unsigned_integer(&mut self) -> Result<U256, DerError> {
        let bytes = self.element(TAG_INTEGER)?.rest();
        if bytes.is_empty() || bytes[0] & 0x80 != 0 {
            return Err(DerError::InvalidInteger);
        }
        let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let magnitude = &bytes[first_nonzero..];
        if magnitude.len() > 32 {
            return Err(DerError::IntegerTooLarge);
        }
        Ok(U256::from_be_slice(magnitude))
    }
}

/// Parses a DER `ECDSA-Sig-Value` into `(r, s)`.
///
/// Both scalars must be in `[1, n)`. `s` is returned as signed, without
/// low-s normalisation.
pub fn parse_signature(der: &[u8]) -> Result<(U256, U256), DerError> {
    let mut outer = DerReader::new(der);
    let mut seq = outer.element(TAG_SEQUENCE)?;
    outer.finish()?;

    let r = seq.unsigned_integer()?;
    let s = seq.unsigned_integer()?;
    seq.finish()?;

    for scalar in [r, s] {
        if scalar.is_zero() || scalar >= SECP256K1_ORDER {
            return Err(DerError::ScalarOutOfRange);
        }
    }
    Ok((r, s))
}

/// Extracts the uncompressed secp256k1 point from a DER SubjectPublicKeyInfo.
pub fn parse_public_key(der: &[u8]) -> Result<[u8; UNCOMPRESSED_POINT_LEN], DerError> {
    let mut outer = DerReader::new(der);
    let mut spki = outer.element(TAG_SEQUENCE)?;
    outer.finish()?;

    let mut algorithm = spki.element(TAG_SEQUENCE)?;
    if algorithm.element(TAG_OID)?.rest() != OID_EC_PUBLIC_KEY {
        return Err(DerError::UnsupportedAlgorithm);
    }
    if algorithm.element(TAG_OID)?.rest() != OID_SECP256K1 {
        return Err(DerError::UnsupportedCurve);
    }
    algorithm.finish()?;

    let bits = spki.element(TAG_BIT_STRING)?.rest();
    spki.finish()?;

    // First byte of a BIT STRING is the count of unused bits.
    match bits.split_first() {
        Some((0, point)) if point.len() == UNCOMPRESSED_POINT_LEN && point[0] == 0x04 => {
            let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
            out.copy_from_slice(point);
            Ok(out)
        }
        _ => Err(DerError::InvalidPoint),
    }
}
