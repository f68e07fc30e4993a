//! Attachment payload codec
//!
//! Standard-alphabet padded Base64, matching the `data` field of
//! archive attachments.

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode attachment bytes for embedding in an archive
pub fn encode_bytes(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode an archive `data` field back to raw bytes
pub fn decode_bytes(encoded: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(encoded)?)
}
