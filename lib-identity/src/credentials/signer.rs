//! Signing capability used for credential proofs

use lib_crypto::{Address, CryptoError, KeyPair, Signature};

/// Anything that can produce an EIP-191 personal signature
pub trait CredentialSigner {
    /// Address that will appear as `verificationMethod`
    fn signer_address(&self) -> Address;

    /// Sign a message with the personal-message prefix
    fn sign_message(&self, message: &[u8]) -> Result<Signature, CryptoError>;
}

impl CredentialSigner for KeyPair {
    fn signer_address(&self) -> Address {
        self.address()
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        self.sign_personal_message(message)
    }
}
