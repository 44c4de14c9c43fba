//! Ethereum account address
//!
//! Displayed in EIP-55 mixed-case checksum form. Parsing is
//! case-insensitive and does not enforce the checksum, matching how wallet
//! addresses arrive from browsers and RPC responses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CryptoError;
use crate::hashing::keccak256;
use crate::types::strip_hex_prefix;

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address
    pub const ZERO: Address = Address([0u8; 20]);

    /// Derive an address from an uncompressed SEC1 public key (65 bytes, 0x04 prefix)
    pub fn from_uncompressed_public_key(encoded: &[u8]) -> Result<Self, CryptoError> {
        if encoded.len() != 65 || encoded[0] != 0x04 {
            return Err(CryptoError::InvalidLength {
                what: "uncompressed public key",
                expected: 65,
                actual: encoded.len(),
            });
        }
        let hash = keccak256(&encoded[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Ok(Address(bytes))
    }

    /// Build from the low 20 bytes of a 32-byte ABI word
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Address(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// `0x`-prefixed lower-case hex (the form used for DIDs and storage keys)
    pub fn to_lowercase_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// `0x`-prefixed EIP-55 checksum encoding
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, ch) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if ch.is_ascii_alphabetic() && nibble >= 8 {
                out.push(ch.to_ascii_uppercase());
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// Whether a string is a syntactically valid address
    pub fn is_valid(input: &str) -> bool {
        input.parse::<Address>().is_ok()
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !(trimmed.starts_with("0x") || trimmed.starts_with("0X")) {
            return Err(CryptoError::InvalidHex(format!(
                "address must start with 0x: {}",
                trimmed
            )));
        }
        let body = strip_hex_prefix(trimmed);
        if body.len() != 40 {
            return Err(CryptoError::InvalidLength {
                what: "address",
                expected: 20,
                actual: body.len() / 2,
            });
        }
        let decoded = hex::decode(body).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
