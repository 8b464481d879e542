//! Value codecs
//!
//! The store keeps raw bytes; a [`Codec`] turns [`Value`]s into those bytes
//! and back at the store boundary.

use crate::error::{FlowError, Result};
use crate::value::Value;

/// Serializes values for storage
pub trait Codec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decode a stored payload; malformed input is a `FlowError::Codec`
    fn decode(&self, bytes: &[u8]) -> Result<Value>;

    fn name(&self) -> &'static str;
}

/// Self-describing JSON encoding, byte strings as `{"$bytes": "<hex>"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&value.to_json()?)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| FlowError::Codec(format!("malformed payload: {}", e)))?;
        Value::from_json(json)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
