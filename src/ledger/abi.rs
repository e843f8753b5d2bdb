//! Contract ABI call encoding
//!
//! Provides Keccak-256 hashing, 4-byte function selectors, and the 32-byte
//! word layout used to encode calls to (and decode returns from) the
//! agreement contract. All functions are pure for easy testing.

use sha3::{Digest, Keccak256};

use crate::ledger::LedgerError;

/// Compute the Keccak-256 hash of the input data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the Keccak-256 hash of the input data as 0x-prefixed hex.
///
/// This is the canonical `terms_hash` representation stored on transaction
/// records.
pub fn keccak256_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(keccak256(data)))
}

/// Compute the 4-byte function selector for a canonical signature.
///
/// The selector is the first four bytes of the Keccak-256 hash of the
/// signature string, e.g. `"recordPayment(uint256,uint256)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Encode an unsigned integer as a big-endian 32-byte word.
pub fn uint_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a full contract call as 0x-prefixed calldata hex.
///
/// Layout: selector, then each argument as one static 32-byte word.
pub fn encode_call(signature: &str, words: &[[u8; 32]]) -> String {
    let mut data = Vec::with_capacity(4 + 32 * words.len());
    data.extend_from_slice(&selector(signature));
    for word in words {
        data.extend_from_slice(word);
    }
    format!("0x{}", hex::encode(data))
}

/// Split 0x-prefixed return data into 32-byte words.
pub fn decode_words(data: &str) -> Result<Vec<[u8; 32]>, LedgerError> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(stripped)
        .map_err(|e| LedgerError::Codec(format!("invalid return data hex: {}", e)))?;
    if bytes.len() % 32 != 0 {
        return Err(LedgerError::Codec(format!(
            "return data length {} is not a multiple of 32",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

/// Decode a 32-byte word as a `u64`.
///
/// Errors when the value does not fit, rather than silently truncating.
pub fn word_to_u64(word: &[u8; 32]) -> Result<u64, LedgerError> {
    if word[..24].iter().any(|byte| *byte != 0) {
        return Err(LedgerError::Codec("uint256 exceeds u64 range".to_string()));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(tail))
}

/// Decode a 32-byte word as a boolean (0 or 1).
pub fn word_to_bool(word: &[u8; 32]) -> Result<bool, LedgerError> {
    match word_to_u64(word)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(LedgerError::Codec(format!(
            "expected boolean word, got {}",
            other
        ))),
    }
}

/// Parse a 0x-prefixed hex quantity (e.g. a block number) as a `u64`.
pub fn parse_hex_u64(text: &str) -> Result<u64, LedgerError> {
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    u64::from_str_radix(stripped, 16)
        .map_err(|e| LedgerError::Codec(format!("invalid hex quantity '{}': {}", text, e)))
}

/// Parse a 0x-prefixed 64-character hash string into 32 bytes.
///
/// Used to send a record's stored `terms_hash` back to the ledger.
pub fn parse_bytes32_hex(text: &str) -> Result<[u8; 32], LedgerError> {
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(stripped)
        .map_err(|e| LedgerError::Codec(format!("invalid hash hex '{}': {}", text, e)))?;
    if bytes.len() != 32 {
        return Err(LedgerError::Codec(format!(
            "expected 32-byte hash, got {} bytes",
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes);
    Ok(word)
}
