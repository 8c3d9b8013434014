//! Textual encodings for key and ciphertext material.
//!
//! Key material travels as lower-case hex (an optional `0x` prefix is
//! accepted on input), ciphertext and nonces as standard padded base64.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Error type for encoding operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid base64: {0}")]
    InvalidBase64(String),
    #[error("invalid length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid json: {0}")]
    InvalidJson(String),
}

/// Decode a hex string, with or without a `0x` prefix.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, CodecError> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    hex::decode(digits).map_err(|e| CodecError::InvalidHex(e.to_string()))
}

/// Encode bytes as lower-case hex without a prefix.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard (non URL-safe) padded base64.
pub fn base64_to_bytes(encoded: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))
}

/// Decode hex into a fixed-size array.
pub fn hex_to_array<const N: usize>(hex: &str) -> Result<[u8; N], CodecError> {
    to_array(hex_to_bytes(hex)?)
}

/// Decode base64 into a fixed-size array.
pub fn base64_to_array<const N: usize>(encoded: &str) -> Result<[u8; N], CodecError> {
    to_array(base64_to_bytes(encoded)?)
}

/// Interpret decrypted bytes as a UTF-8 message.
pub fn utf8_to_string(bytes: Vec<u8>) -> Result<String, CodecError> {
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}

fn to_array<const N: usize>(bytes: Vec<u8>) -> Result<[u8; N], CodecError> {
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CodecError::InvalidLength { expected: N, got })
}
