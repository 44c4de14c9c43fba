//! secp256k1 key pair generation and signing

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;

use crate::errors::{CryptoError, CryptoResult};
use crate::types::{Address, PrivateKey, Signature};
use crate::verification::personal_message_hash;

/// secp256k1 key pair with its derived account address
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    address: Address,
}

impl KeyPair {
    /// Build a key pair from a 32-byte secret scalar
    ///
    /// Fails if the scalar is zero or not below the curve order.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> CryptoResult<Self> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|_| CryptoError::InvalidSecretKey)?;
        let address = address_of(signing_key.verifying_key())?;
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Build a key pair from a stored private key
    pub fn from_private_key(private_key: &PrivateKey) -> CryptoResult<Self> {
        Self::from_secret_bytes(private_key.as_bytes())
    }

    /// Generate a fresh random key pair from the OS entropy source
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        // Uncompressed encoding of a valid point is always 65 bytes
        let address = address_of(signing_key.verifying_key()).unwrap_or(Address::ZERO);
        Self {
            signing_key,
            address,
        }
    }

    /// Account address of this key pair
    pub fn address(&self) -> Address {
        self.address
    }

    /// Secret scalar (zeroized when the returned value drops)
    pub fn private_key(&self) -> PrivateKey {
        let field_bytes = self.signing_key.to_bytes();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&field_bytes);
        PrivateKey::from_bytes(bytes)
    }

    /// Uncompressed SEC1 public key (65 bytes)
    pub fn public_key_uncompressed(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    /// Sign a 32-byte prehash, producing a recoverable signature
    pub fn sign_prehash(&self, prehash: &[u8; 32]) -> CryptoResult<Signature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let mut rs = [0u8; 64];
        rs.copy_from_slice(&signature.to_bytes());
        Ok(Signature::from_parts(&rs, recovery_id.to_byte()))
    }

    /// EIP-191 personal-message signature (what `signer.signMessage` produces)
    pub fn sign_personal_message(&self, message: &[u8]) -> CryptoResult<Signature> {
        self.sign_prehash(&personal_message_hash(message))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive the account address of a verifying key
pub(crate) fn address_of(verifying_key: &VerifyingKey) -> CryptoResult<Address> {
    let encoded = verifying_key.to_encoded_point(false);
    Address::from_uncompressed_public_key(encoded.as_bytes())
}
