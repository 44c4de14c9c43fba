//! EIP-191 personal-message hashing and signer recovery
//!
//! `personal_sign` messages are hashed as
//! `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`
//! where `len` is the decimal byte length.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};

use crate::errors::{CryptoError, CryptoResult};
use crate::hashing::keccak256_multiple;
use crate::keypair::generation::address_of;
use crate::types::{Address, Signature};

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Hash a message the way `personal_sign` / `signMessage` does
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let length = message.len().to_string();
    keccak256_multiple(&[
        PERSONAL_MESSAGE_PREFIX.as_bytes(),
        length.as_bytes(),
        message,
    ])
}

/// Recover the signing address from a 32-byte prehash
pub fn recover_prehash_signer(prehash: &[u8; 32], signature: &Signature) -> CryptoResult<Address> {
    let ecdsa = EcdsaSignature::from_slice(&signature.rs())
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id())
        .ok_or_else(|| CryptoError::InvalidSignature("recovery id out of range".to_string()))?;
    let verifying_key = VerifyingKey::recover_from_prehash(prehash, &ecdsa, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    address_of(&verifying_key)
}

/// Recover the address that produced a personal-message signature
pub fn recover_personal_signer(message: &[u8], signature: &Signature) -> CryptoResult<Address> {
    recover_prehash_signer(&personal_message_hash(message), signature)
}

/// Check a personal-message signature against an expected signer
///
/// Returns `Ok(false)` on a well-formed signature from someone else.
pub fn verify_personal_signature(
    message: &[u8],
    signature: &Signature,
    expected: &Address,
) -> CryptoResult<bool> {
    let recovered = recover_personal_signer(message, signature)?;
    Ok(&recovered == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::KeyPair;

    #[test]
    fn test_personal_hash_includes_decimal_length() {
        let direct = crate::hashing::keccak256(b"\x19Ethereum Signed Message:\n11hello world");
        assert_eq!(personal_message_hash(b"hello world"), direct);
    }

    #[test]
    fn test_sign_then_recover() {
        let keypair = KeyPair::generate();
        let message = b"{\"donation\":\"10000\"}";
        let signature = keypair.sign_personal_message(message).unwrap();

        let recovered = recover_personal_signer(message, &signature).unwrap();
        assert_eq!(recovered, keypair.address());
        assert!(verify_personal_signature(message, &signature, &keypair.address()).unwrap());
    }

    #[test]
    fn test_altered_message_recovers_different_signer() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign_personal_message(b"amount=100").unwrap();
        let verified =
            verify_personal_signature(b"amount=900", &signature, &keypair.address()).unwrap_or(false);
        assert!(!verified);
    }

    #[test]
    fn test_signature_from_other_key_fails() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let signature = bob.sign_personal_message(b"hello").unwrap();
        assert!(!verify_personal_signature(b"hello", &signature, &alice.address()).unwrap());
    }
}
