//! Serialization boundary between raw bytes and the text payloads carried by the
//! RPC channel. Only this module knows the payload is base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::Result;

/// Encodes bytes as padded, standard-alphabet base64.
pub fn bytes_to_transport_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes a transport payload back into bytes.
///
/// Surrounding whitespace and embedded line breaks are ignored; some RPC
/// encoders wrap long base64 values at 76 columns.
pub fn transport_text_to_bytes(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}
