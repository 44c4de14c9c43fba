//! Donation Village Identity Package
//!
//! Account identity for the donation village: every user is an Ethereum
//! account on Arbitrum, named by a `did:ethr` DID, and accumulates
//! Verifiable Credentials for donations and badges.
//!
//! ## Primary API
//!
//! - `derive_wallet(email)` for the deterministic embedded wallet
//! - `create_did` / `parse_did` / `create_did_document`
//! - `issue_credential`, `sign_credential`, `verify_credential`
//! - `AuthService` for email, Google and MetaMask logins

pub mod auth;
pub mod constants;
pub mod credentials;
pub mod did;
pub mod wallets;

// Re-exports for external use
pub use auth::{AuthError, AuthService, Session, SessionRecord, SessionWallet, UserProfile};
pub use credentials::{
    canonical_json, create_badge_credential, create_donation_credential, issue_credential,
    sign_credential, verify_credential, verify_credential_json, BadgeDescriptor, CredentialClaims, CredentialError,
    CredentialKind, CredentialProof, CredentialSigner, CredentialSubject, VerifiableCredential,
};
pub use did::{
    create_did, create_did_document, network_label, parse_did, DidDocument, DidError,
    ServiceEndpoint, VerificationMethod,
};
pub use wallets::{derive_wallet, EmbeddedWallet, WalletError, WalletType};

// External dependencies re-exports
pub use lib_crypto as crypto;
