//! Secret key material
//!
//! The 32-byte secp256k1 scalar is wiped on drop and never printed.

use std::fmt;
use std::str::FromStr;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::CryptoError;
use crate::types::strip_hex_prefix;

/// secp256k1 private key bytes
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Wrap raw scalar bytes (validity against the curve order is checked by `KeyPair`)
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw scalar
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed hex encoding
    ///
    /// Callers decide where this may go; it is never persisted by the library.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for PrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_hex_prefix(s.trim());
        let decoded = hex::decode(body).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        if decoded.len() != 32 {
            return Err(CryptoError::InvalidLength {
                what: "private key",
                expected: 32,
                actual: decoded.len(),
            });
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

// Constant-time comparison so equality checks do not leak key prefixes
impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}
