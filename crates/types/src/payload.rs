//! Caller-supplied payload accepted for blob submission.

use serde::Deserialize;
use serde_json::Value;

use crate::{aliases::Bytes, constants::MAX_REQUEST_PAYLOAD_BYTES};

/// Errors raised while turning a request body into a [`Payload`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("request must contain a `json` or `data` field")]
    Missing,

    #[error("payload is {size} bytes, maximum is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("payload could not be serialized: {0}")]
    Serialize(String),
}

/// Body of a submission request: `{ "json": ... }` or `{ "data": ... }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub json: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Opaque payload bytes, at most [`MAX_REQUEST_PAYLOAD_BYTES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Bytes);

impl Payload {
    /// Wraps raw bytes, enforcing the request-level size limit.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self, PayloadError> {
        let bytes = bytes.into();
        if bytes.len() > MAX_REQUEST_PAYLOAD_BYTES {
            return Err(PayloadError::TooLarge {
                size: bytes.len(),
                max: MAX_REQUEST_PAYLOAD_BYTES,
            });
        }
        Ok(Self(bytes))
    }

    /// Serializes a JSON value. Strings are taken verbatim, everything else is
    /// written in compact form.
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        let bytes = match value {
            Value::String(s) => s.as_bytes().to_vec(),
            other => serde_json::to_vec(other).map_err(|e| PayloadError::Serialize(e.to_string()))?,
        };
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&SubmitRequest> for Payload {
    type Error = PayloadError;

    fn try_from(request: &SubmitRequest) -> Result<Self, Self::Error> {
        let value = request
            .json
            .as_ref()
            .or(request.data.as_ref())
            .filter(|value| !value.is_null())
            .ok_or(PayloadError::Missing)?;
        Self::from_value(value)
    }
}
