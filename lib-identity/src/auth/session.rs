//! Session token management for logged-in users

use lib_crypto::{keccak256_multiple, Address};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::constants::{
    ARBITRUM_SEPOLIA_CHAIN_ID, DEFAULT_SESSION_SECS, METAMASK_DISPLAY_NAME, METAMASK_EMAIL_SUFFIX,
};
use crate::credentials::CredentialSigner;
use crate::did::create_did;
use crate::wallets::{derive_wallet, EmbeddedWallet, WalletError, WalletType};

/// Login or session restore failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Session expired")]
    Expired,
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Session token for logged-in users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub created_at: u64,
    pub expires_at: u64,
    pub last_used: u64,
}

impl SessionToken {
    /// Generate a new session token bound to an address
    pub fn new(address: &Address, duration_seconds: u64) -> Self {
        let now = unix_now();

        let mut random_bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut random_bytes);

        let token_hash = keccak256_multiple(&[
            address.as_bytes(),
            &now.to_le_bytes(),
            &random_bytes,
            b"village_session_token_v1",
        ]);

        SessionToken {
            token: hex::encode(token_hash),
            created_at: now,
            expires_at: now.saturating_add(duration_seconds),
            last_used: now,
        }
    }

    /// Check if session token is still valid
    pub fn is_valid(&self) -> bool {
        unix_now() < self.expires_at
    }

    /// Update last used timestamp
    pub fn touch(&mut self) {
        self.last_used = unix_now();
    }
}

/// Who is logged in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub name: Option<String>,
    pub wallet_address: Address,
    pub did: String,
    pub wallet_type: WalletType,
    pub is_organization: bool,
}

/// Wallet attached to a live session
#[derive(Debug, Clone)]
pub enum SessionWallet {
    /// Key held in memory, re-derived from the email
    Embedded(EmbeddedWallet),
    /// Key held by the browser extension; only the address is known
    External(Address),
}

impl SessionWallet {
    pub fn address(&self) -> Address {
        match self {
            SessionWallet::Embedded(wallet) => wallet.address(),
            SessionWallet::External(address) => *address,
        }
    }
}

/// A live login session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub profile: UserProfile,
    pub chain_id: u64,
    wallet: SessionWallet,
}

impl Session {
    pub fn wallet(&self) -> &SessionWallet {
        &self.wallet
    }

    /// Signer for credentials; only embedded wallets can sign here
    pub fn signer(&self) -> Option<&dyn CredentialSigner> {
        match &self.wallet {
            SessionWallet::Embedded(wallet) => Some(wallet as &dyn CredentialSigner),
            SessionWallet::External(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.token.is_valid()
    }

    /// Persistable form without key material
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            token: self.token.token.clone(),
            email: self.profile.email.clone(),
            name: self.profile.name.clone(),
            wallet_type: self.profile.wallet_type,
            wallet_address: self.profile.wallet_address,
            is_organization: self.profile.is_organization,
            chain_id: self.chain_id,
            created_at: self.token.created_at,
            expires_at: self.token.expires_at,
        }
    }
}

/// Stored session (browser storage, file, or database row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub token: String,
    pub email: String,
    pub name: Option<String>,
    pub wallet_type: WalletType,
    pub wallet_address: Address,
    pub is_organization: bool,
    pub chain_id: u64,
    pub created_at: u64,
    pub expires_at: u64,
}

/// Issues and restores sessions
#[derive(Debug, Clone)]
pub struct AuthService {
    chain_id: u64,
    session_secs: u64,
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new(ARBITRUM_SEPOLIA_CHAIN_ID)
    }
}

impl AuthService {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            session_secs: DEFAULT_SESSION_SECS,
        }
    }

    pub fn with_session_secs(mut self, session_secs: u64) -> Self {
        self.session_secs = session_secs;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Email login: derive the embedded wallet from the email
    pub fn login_with_email(
        &self,
        email: &str,
        name: Option<&str>,
        is_organization: bool,
    ) -> Result<Session, AuthError> {
        let wallet = derive_wallet(email)?;
        let profile = UserProfile {
            email: email.to_string(),
            name: name.map(str::to_string),
            wallet_address: wallet.address(),
            did: wallet.did(self.chain_id),
            wallet_type: WalletType::Embedded,
            is_organization,
        };
        info!(address = %profile.wallet_address, "Email login");
        Ok(self.open(profile, SessionWallet::Embedded(wallet), self.chain_id))
    }

    /// Google OAuth callback: same derivation as email login
    ///
    /// The display name falls back to the local part of the email.
    pub fn login_with_google(
        &self,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<Session, AuthError> {
        let fallback = email.split('@').next().unwrap_or(email);
        let name = full_name.filter(|n| !n.is_empty()).unwrap_or(fallback);
        self.login_with_email(email, Some(name), false)
    }

    /// MetaMask login: the address comes from the extension
    pub fn login_with_metamask(&self, address: &Address, chain_id: u64) -> Session {
        let profile = UserProfile {
            email: format!("{}{}", address.to_lowercase_hex(), METAMASK_EMAIL_SUFFIX),
            name: Some(METAMASK_DISPLAY_NAME.to_string()),
            wallet_address: *address,
            did: create_did(address, chain_id),
            wallet_type: WalletType::Metamask,
            is_organization: false,
        };
        info!(address = %address, chain_id, "MetaMask login");
        self.open(profile, SessionWallet::External(*address), chain_id)
    }

    /// End a session; the embedded key is zeroized when the wallet drops
    pub fn logout(&self, session: Session) {
        info!(address = %session.profile.wallet_address, "Logout");
        drop(session);
    }

    /// Rebuild a live session from its stored record
    pub fn restore(&self, record: &SessionRecord) -> Result<Session, AuthError> {
        if unix_now() >= record.expires_at {
            return Err(AuthError::Expired);
        }

        let wallet = match record.wallet_type {
            WalletType::Embedded => {
                let wallet = derive_wallet(&record.email)?;
                if wallet.address() != record.wallet_address {
                    return Err(WalletError::AddressMismatch {
                        expected: record.wallet_address.to_checksum(),
                        derived: wallet.address().to_checksum(),
                    }
                    .into());
                }
                SessionWallet::Embedded(wallet)
            }
            WalletType::Metamask => SessionWallet::External(record.wallet_address),
        };

        let now = unix_now();
        Ok(Session {
            token: SessionToken {
                token: record.token.clone(),
                created_at: record.created_at,
                expires_at: record.expires_at,
                last_used: now,
            },
            profile: UserProfile {
                email: record.email.clone(),
                name: record.name.clone(),
                wallet_address: record.wallet_address,
                did: create_did(&record.wallet_address, record.chain_id),
                wallet_type: record.wallet_type,
                is_organization: record.is_organization,
            },
            chain_id: record.chain_id,
            wallet,
        })
    }

    fn open(&self, profile: UserProfile, wallet: SessionWallet, chain_id: u64) -> Session {
        Session {
            token: SessionToken::new(&profile.wallet_address, self.session_secs),
            profile,
            chain_id,
            wallet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_is_random_and_valid() {
        let a = SessionToken::new(&Address::ZERO, 60);
        let b = SessionToken::new(&Address::ZERO, 60);
        assert_ne!(a.token, b.token);
        assert_eq!(a.token.len(), 64);
        assert!(a.is_valid());
    }

    #[test]
    fn test_zero_duration_token_is_expired() {
        let token = SessionToken::new(&Address::ZERO, 0);
        assert!(!token.is_valid());
    }

    #[test]
    fn test_google_login_name_fallback() {
        let auth = AuthService::default();
        let session = auth.login_with_google("kim@example.com", None).unwrap();
        assert_eq!(session.profile.name.as_deref(), Some("kim"));
        assert_eq!(session.profile.wallet_type, WalletType::Embedded);
    }

    #[test]
    fn test_metamask_session_cannot_sign() {
        let auth = AuthService::default();
        let address: Address = "0x0000000000000000000000000000000000000abc".parse().unwrap();
        let session = auth.login_with_metamask(&address, 421614);
        assert_eq!(
            session.profile.email,
            "0x0000000000000000000000000000000000000abc@metamask"
        );
        assert_eq!(session.profile.name.as_deref(), Some("MetaMask Wallet"));
        assert!(session.signer().is_none());
    }

    #[test]
    fn test_expired_record_is_rejected() {
        let auth = AuthService::default();
        let mut record = auth.login_with_email("a@b.c", None, false).unwrap().to_record();
        record.expires_at = 0;
        assert_eq!(auth.restore(&record).unwrap_err(), AuthError::Expired);
    }
}
