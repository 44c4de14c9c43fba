//! Credential data structures (W3C VC data model, JSON field names as issued)

use serde::{Deserialize, Serialize};

/// Which credential family a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    Donation,
    Badge,
}

impl CredentialKind {
    /// Second entry of the credential `type` array
    pub fn type_name(&self) -> &'static str {
        match self {
            CredentialKind::Donation => "DonationCredential",
            CredentialKind::Badge => "BadgeCredential",
        }
    }
}

/// A Verifiable Credential
///
/// Unknown fields are rejected at every level; the proof covers only the
/// fields modelled here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    pub issuer: String,
    #[serde(rename = "issuanceDate")]
    pub issuance_date: String,
    #[serde(rename = "credentialSubject")]
    pub credential_subject: CredentialSubject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<CredentialProof>,
}

impl VerifiableCredential {
    /// DID the credential is about
    pub fn subject_did(&self) -> &str {
        match &self.credential_subject {
            CredentialSubject::Donation(subject) => &subject.id,
            CredentialSubject::Badge(subject) => &subject.id,
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self.credential_subject {
            CredentialSubject::Donation(_) => CredentialKind::Donation,
            CredentialSubject::Badge(_) => CredentialKind::Badge,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.proof.is_some()
    }

    /// Copy of the credential with the proof removed
    pub fn without_proof(&self) -> VerifiableCredential {
        VerifiableCredential {
            proof: None,
            ..self.clone()
        }
    }
}

/// Credential subject payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CredentialSubject {
    Donation(DonationSubject),
    Badge(BadgeSubject),
}

/// Subject of a donation credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DonationSubject {
    /// Donor DID
    pub id: String,
    /// Donated amount in wei, as a decimal string
    pub donation_amount: String,
    pub donation_count: u64,
    pub campaign_id: String,
    pub tx_hash: String,
    pub timestamp: String,
}

/// Subject of a badge credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BadgeSubject {
    /// Badge holder DID
    pub id: String,
    pub badge: BadgeDescriptor,
}

/// Badge details carried inside a badge credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BadgeDescriptor {
    pub name: String,
    pub tier: String,
    pub description: String,
    pub criteria: String,
    pub image_url: String,
}

/// Signature block attached by `sign_credential`
///
/// Fields are kept as strings so that a malformed proof still parses and is
/// rejected by verification instead of by deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CredentialProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: String,
    pub proof_purpose: String,
    /// Signer address
    pub verification_method: String,
    /// `0x`-prefixed 65-byte signature
    pub signature: String,
}
