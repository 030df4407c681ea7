//! Payload codec
//!
//! Turns records into slot payloads and back.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Serialize/deserialize capability applied to every slot payload
///
/// Implementations must never emit a zero byte: the slot format uses it as
/// the payload terminator.
pub trait PayloadCodec {
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>>;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T>;
}

/// Compact JSON via serde_json
///
/// JSON escapes control characters in strings, so the output never contains
/// a raw zero byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
