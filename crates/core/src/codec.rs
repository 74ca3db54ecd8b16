//! Base64 text encoding for binary content embedded in JSON.
//!
//! Always the standard alphabet with padding. Optional inputs pass through so
//! callers can encode fields that may be absent without branching.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode bytes as standard base64.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a standard base64 string.
pub fn decode(text: &str) -> crate::Result<Vec<u8>> {
    Ok(STANDARD.decode(text)?)
}

/// Encode an optional value, mapping `None` to `None`.
pub fn encode_opt(data: Option<&[u8]>) -> Option<String> {
    data.map(encode)
}

/// Decode an optional value, mapping `None` to `None`.
pub fn decode_opt(text: Option<&str>) -> crate::Result<Option<Vec<u8>>> {
    text.map(decode).transpose()
}
