//! Deterministic wallet derivation
//!
//! seed = keccak256(utf8(email)), used directly as the secp256k1 secret.
//! This is the `new Wallet(id(email))` convention, so the same email yields
//! the same address here and in any ethers-based client. The email is taken
//! byte-for-byte; callers that want case-insensitive logins must normalize
//! before calling.

use lib_crypto::{keccak_id, KeyPair};
use tracing::debug;

use super::{EmbeddedWallet, WalletError};

/// Derive the embedded wallet for an email
pub fn derive_wallet(email: &str) -> Result<EmbeddedWallet, WalletError> {
    if email.is_empty() {
        return Err(WalletError::EmptyEmail);
    }

    let mut seed = keccak_id(email);
    let keypair = KeyPair::from_secret_bytes(&seed).map_err(|_| WalletError::InvalidSeed);
    seed.iter_mut().for_each(|b| *b = 0);
    let keypair = keypair?;

    debug!(address = %keypair.address(), "Derived embedded wallet");
    Ok(EmbeddedWallet::new(email.to_string(), keypair))
}
