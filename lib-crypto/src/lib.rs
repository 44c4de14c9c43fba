//! Donation Village Cryptography Foundation
//!
//! Ethereum-compatible primitives used by the identity and credential layers:
//!
//! - Keccak-256 hashing (the hash behind addresses, `ethers.id`, and EIP-191)
//! - secp256k1 key pairs with zeroized secret material
//! - Checksummed (EIP-55) addresses
//! - EIP-191 personal-message signing and signer recovery

pub mod errors;
pub mod hashing;
pub mod keypair;
pub mod types;
pub mod verification;

// Re-export commonly used types and functions
pub use errors::{CryptoError, CryptoResult};
pub use hashing::{keccak256, keccak256_multiple, keccak_id};
pub use keypair::KeyPair;
pub use types::{Address, PrivateKey, Signature};
pub use verification::{personal_message_hash, recover_personal_signer, verify_personal_signature};
