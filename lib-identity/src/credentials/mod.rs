//! Verifiable Credentials for donations and badges
//!
//! Credentials are issued unsigned, then signed with an EIP-191 personal
//! signature over their canonical JSON. Verification recovers the signer and
//! compares it with the proof's `verificationMethod`.

pub mod issuance;
pub mod signer;
pub mod types;
pub mod verification;

pub use issuance::{
    create_badge_credential, create_donation_credential, issue_credential, CredentialClaims,
};
pub use signer::CredentialSigner;
pub use types::{
    BadgeDescriptor, BadgeSubject, CredentialKind, CredentialProof, CredentialSubject,
    DonationSubject, VerifiableCredential,
};
pub use verification::{canonical_json, sign_credential, verify_credential, verify_credential_json};

use thiserror::Error;

/// Failure while signing a credential
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Credential serialization failed: {0}")]
    Serialization(String),

    #[error("Credential signing failed: {0}")]
    Signing(#[from] lib_crypto::CryptoError),
}
