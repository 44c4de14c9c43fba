//! Network-wide constants for Donation Village identity
//!
//! Shared by DID formatting, credential contexts and session handling so
//! every crate agrees on the same network labels.

/// Arbitrum Sepolia testnet chain id (the deployment target)
pub const ARBITRUM_SEPOLIA_CHAIN_ID: u64 = 421614;

/// Arbitrum One mainnet chain id
pub const ARBITRUM_ONE_CHAIN_ID: u64 = 42161;

/// DID network label for Arbitrum Sepolia
pub const NETWORK_ARBITRUM_SEPOLIA: &str = "arbitrum-sepolia";

/// DID network label for every other chain id
pub const NETWORK_ARBITRUM: &str = "arbitrum";

/// DID method prefix
pub const DID_ETHR_PREFIX: &str = "did:ethr:";

/// W3C DID core context
pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";

/// W3C Verifiable Credentials context
pub const CREDENTIALS_CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";

/// Donation credential context
pub const DONATION_CREDENTIAL_CONTEXT: &str = "https://www.donation-village.org/credentials/v1";

/// Badge credential context
pub const BADGE_CREDENTIAL_CONTEXT: &str = "https://www.donation-village.org/credentials/badge/v1";

/// Proof type recorded on signed credentials
pub const PROOF_TYPE: &str = "EthereumEip712Signature2021";

/// Proof purpose recorded on signed credentials
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// Verification method type in DID documents
pub const VERIFICATION_METHOD_TYPE: &str = "EcdsaSecp256k1RecoveryMethod2020";

/// Email suffix given to MetaMask logins, which carry no real email
pub const METAMASK_EMAIL_SUFFIX: &str = "@metamask";

/// Display name given to MetaMask logins
pub const METAMASK_DISPLAY_NAME: &str = "MetaMask Wallet";

/// Default session lifetime (7 days)
pub const DEFAULT_SESSION_SECS: u64 = 7 * 24 * 60 * 60;
