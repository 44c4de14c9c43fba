//! Hashing module for Donation Village cryptography
//!
//! Keccak-256 is the only hash used for identity material: it derives
//! addresses from public keys, seeds embedded wallets from emails, and
//! prefixes EIP-191 personal messages.
//!
//! Note this is the original Keccak padding used by Ethereum, not the
//! finalized NIST SHA3-256.

use sha3::{Digest, Keccak256};

/// Keccak-256 of a byte slice
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple data segments as if they were concatenated
pub fn keccak256_multiple(data_segments: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for segment in data_segments {
        hasher.update(segment);
    }
    hasher.finalize().into()
}

/// Keccak-256 of a UTF-8 string (the `ethers.id` convention)
///
/// Used for event topics and email-derived wallet seeds.
pub fn keccak_id(text: &str) -> [u8; 32] {
    keccak256(text.as_bytes())
}
