//! Wallets owned by Donation Village identities
//!
//! Two kinds exist: embedded wallets whose key is derived from the login email,
//! and external MetaMask wallets where only the address is known here.

pub mod derivation;
pub mod wallet_types;

pub use derivation::derive_wallet;
pub use wallet_types::{EmbeddedWallet, WalletType};

use thiserror::Error;

/// Error raised while deriving or restoring a wallet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Email must not be empty")]
    EmptyEmail,

    #[error("Email-derived seed is not a valid secp256k1 scalar")]
    InvalidSeed,

    #[error("Wallet address mismatch: expected {expected}, derived {derived}")]
    AddressMismatch { expected: String, derived: String },
}
