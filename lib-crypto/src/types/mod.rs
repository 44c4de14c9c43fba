//! Core cryptographic types

pub mod address;
pub mod keys;
pub mod signatures;

pub use address::Address;
pub use keys::PrivateKey;
pub use signatures::Signature;

/// Strip an optional `0x`/`0X` prefix from a hex string
pub(crate) fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}
