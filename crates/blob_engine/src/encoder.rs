//! Payload ⇄ blob packing.
//!
//! Each 32-byte field element carries a zero high byte followed by 31 payload
//! bytes, which keeps every element below the BLS12-381 scalar modulus:
//!
//! ```text
//! element i:  [0x00][payload[31*i .. 31*i + 31]]
//! ```
//!
//! Bytes past the end of the payload are zero.

use blobcast_types::{
    aliases::Bytes,
    blob::{
        BLOB_DATA_CAPACITY, BYTES_PER_BLOB, BYTES_PER_FIELD_ELEMENT, Blob,
        USABLE_BYTES_PER_FIELD_ELEMENT,
    },
};

use crate::error::EncodeError;

/// Packs `payload` into a blob.
///
/// # Errors
///
/// Returns [`EncodeError::CapacityExceeded`] if the payload is larger than
/// [`BLOB_DATA_CAPACITY`]. Payloads are never truncated.
pub fn encode_payload(payload: &[u8]) -> Result<Blob, EncodeError> {
    if payload.len() > BLOB_DATA_CAPACITY {
        return Err(EncodeError::CapacityExceeded {
            size: payload.len(),
            capacity: BLOB_DATA_CAPACITY,
        });
    }

    let mut data = vec![0u8; BYTES_PER_BLOB];
    for (element, chunk) in
        data.chunks_exact_mut(BYTES_PER_FIELD_ELEMENT).zip(payload.chunks(USABLE_BYTES_PER_FIELD_ELEMENT))
    {
        element[1..1 + chunk.len()].copy_from_slice(chunk);
    }

    Ok(Blob::new(Bytes::from(data))?)
}

/// Unpacks the payload bytes of a blob, dropping the zero-filled tail.
///
/// Trailing `0x00` bytes of the original payload cannot be told apart from
/// padding and are dropped as well.
pub fn decode_payload(blob: &Blob) -> Vec<u8> {
    let mut out = Vec::with_capacity(BLOB_DATA_CAPACITY);
    for element in blob.data().chunks_exact(BYTES_PER_FIELD_ELEMENT) {
        out.extend_from_slice(&element[1..]);
    }
    let end = out.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    out.truncate(end);
    out
}

/// Number of field elements a payload of `len` bytes occupies.
pub const fn field_elements_used(len: usize) -> usize {
    len.div_ceil(USABLE_BYTES_PER_FIELD_ELEMENT)
}
