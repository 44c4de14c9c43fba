//! Core chain value types
//!
//! Transaction hashes plus decoding helpers for JSON-RPC quantities and
//! 32-byte ABI words.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ChainError, ChainResult};

/// 32-byte transaction hash
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// `0x`-prefixed lower-case hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Whether a string is `0x` followed by exactly 64 hex digits
    pub fn is_valid(input: &str) -> bool {
        input.parse::<TxHash>().is_ok()
    }
}

impl FromStr for TxHash {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ChainError::InvalidHash(s.to_string()))?;
        if body.len() != 64 {
            return Err(ChainError::InvalidHash(s.to_string()));
        }
        let decoded = hex::decode(body).map_err(|_| ChainError::InvalidHash(s.to_string()))?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(TxHash(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a JSON-RPC hex quantity (`0x1a`) as u64
pub fn parse_quantity(raw: &str) -> ChainResult<u64> {
    let body = raw
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidResponse(format!("quantity without 0x: {}", raw)))?;
    if body.is_empty() {
        return Err(ChainError::InvalidResponse("empty quantity".to_string()));
    }
    u64::from_str_radix(body, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("bad quantity {}: {}", raw, e)))
}

/// Decode hex (with or without `0x`) into bytes
pub fn decode_hex(raw: &str) -> ChainResult<Vec<u8>> {
    let body = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(body).map_err(|e| ChainError::MalformedLog(format!("bad hex: {}", e)))
}

/// Decode a 32-byte hex word
pub fn decode_word(raw: &str) -> ChainResult<[u8; 32]> {
    let bytes = decode_hex(raw)?;
    if bytes.len() != 32 {
        return Err(ChainError::MalformedLog(format!(
            "expected 32-byte word, got {} bytes",
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes);
    Ok(word)
}

/// Interpret a big-endian uint256 word as u128
pub fn word_to_u128(word: &[u8; 32]) -> ChainResult<u128> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::ValueOverflow("u128"));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

/// Interpret a big-endian uint256 word as u64
pub fn word_to_u64(word: &[u8; 32]) -> ChainResult<u64> {
    u64::try_from(word_to_u128(word)?).map_err(|_| ChainError::ValueOverflow("u64"))
}

/// Encode a u128 as a big-endian uint256 word
pub fn u128_to_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_hash_validation() {
        let good = format!("0x{}", "ab".repeat(32));
        assert!(TxHash::is_valid(&good));
        assert_eq!(good.parse::<TxHash>().unwrap().to_hex(), good);
        assert!(!TxHash::is_valid(&"ab".repeat(32)));
        assert!(!TxHash::is_valid("0x1234"));
        assert!(!TxHash::is_valid(&format!("0x{}", "zz".repeat(32))));
    }

    #[test]
    fn test_tx_hash_is_lowercased() {
        let upper = format!("0x{}", "AB".repeat(32));
        assert_eq!(upper.parse::<TxHash>().unwrap().to_hex(), upper.to_lowercase());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1").unwrap(), 1);
        assert_eq!(parse_quantity("0x66eee").unwrap(), 421614);
        assert!(parse_quantity("12").is_err());
        assert!(parse_quantity("0x").is_err());
    }

    #[test]
    fn test_word_conversions() {
        let word = u128_to_word(10_000_000_000_000_000);
        assert_eq!(word_to_u128(&word).unwrap(), 10_000_000_000_000_000);
        assert_eq!(word_to_u64(&u128_to_word(42)).unwrap(), 42);

        let mut huge = [0u8; 32];
        huge[0] = 1;
        assert_eq!(word_to_u128(&huge).unwrap_err(), ChainError::ValueOverflow("u128"));
        assert!(word_to_u64(&u128_to_word(u128::from(u64::MAX) + 1)).is_err());
    }
}
