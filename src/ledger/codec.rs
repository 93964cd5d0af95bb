use crate::ledger::LedgerEntry;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode entry: {0}")]
    EncodeError(String),

    #[error("Failed to decode entry: {0}")]
    DecodeError(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Compact binary and text encodings of a [`LedgerEntry`]
pub struct EntryCodec;

impl EntryCodec {
    /// Encode to postcard bytes
    pub fn encode(entry: &LedgerEntry) -> Result<Vec<u8>, CodecError> {
        postcard::to_allocvec(entry).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<LedgerEntry, CodecError> {
        postcard::from_bytes(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    pub fn encode_hex(entry: &LedgerEntry) -> Result<String, CodecError> {
        Self::encode(entry).map(hex::encode)
    }

    pub fn decode_hex(hex_str: &str) -> Result<LedgerEntry, CodecError> {
        let bytes = hex::decode(hex_str).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Encode to base64 string (URL-safe, no padding)
    pub fn encode_base64(entry: &LedgerEntry) -> Result<String, CodecError> {
        Self::encode(entry).map(|bytes| URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn decode_base64(b64_str: &str) -> Result<LedgerEntry, CodecError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str)
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&bytes)
    }
}
