//! Wallet types

use std::fmt;
use std::str::FromStr;

use lib_crypto::{Address, CryptoError, KeyPair, PrivateKey, Signature};
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialSigner;
use crate::did::create_did;

/// How a user's key is held
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    /// Key derived from the login email and held by the application
    Embedded,
    /// Key held by the MetaMask browser extension
    Metamask,
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletType::Embedded => write!(f, "embedded"),
            WalletType::Metamask => write!(f, "metamask"),
        }
    }
}

impl FromStr for WalletType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "embedded" => Ok(WalletType::Embedded),
            "metamask" => Ok(WalletType::Metamask),
            other => Err(format!("Unknown wallet type: {}", other)),
        }
    }
}

/// Wallet whose key pair is a pure function of an email
///
/// The key lives only in memory; dropping the wallet zeroizes it.
#[derive(Clone)]
pub struct EmbeddedWallet {
    email: String,
    keypair: KeyPair,
}

impl EmbeddedWallet {
    pub(crate) fn new(email: String, keypair: KeyPair) -> Self {
        Self { email, keypair }
    }

    /// Email the wallet was derived from
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Account address
    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// Private key (handle with care; never persisted by this crate)
    pub fn private_key(&self) -> PrivateKey {
        self.keypair.private_key()
    }

    /// DID for this wallet on the given chain
    pub fn did(&self, chain_id: u64) -> String {
        create_did(&self.address(), chain_id)
    }

    /// Underlying key pair
    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }
}

impl fmt::Debug for EmbeddedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedWallet")
            .field("email", &self.email)
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl CredentialSigner for EmbeddedWallet {
    fn signer_address(&self) -> Address {
        self.address()
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        self.keypair.sign_personal_message(message)
    }
}
