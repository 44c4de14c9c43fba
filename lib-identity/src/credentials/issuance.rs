//! Credential issuance

use chrono::{SecondsFormat, Utc};
use lib_crypto::Address;

use super::types::{
    BadgeDescriptor, BadgeSubject, CredentialKind, CredentialSubject, DonationSubject,
    VerifiableCredential,
};
use crate::constants::{
    BADGE_CREDENTIAL_CONTEXT, CREDENTIALS_CONTEXT_V1, DONATION_CREDENTIAL_CONTEXT,
};
use crate::did::create_did;

/// Claims placed in a new credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialClaims {
    Donation {
        /// Wei, as a decimal string
        donation_amount: String,
        donation_count: u64,
        campaign_id: String,
        tx_hash: String,
        timestamp: String,
    },
    Badge(BadgeDescriptor),
}

/// Current time as RFC 3339 with millisecond precision and a `Z` suffix
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Issue an unsigned credential about `subject_did`
pub fn issue_credential(
    subject_did: &str,
    issuer_did: &str,
    claims: CredentialClaims,
) -> VerifiableCredential {
    let (kind, subject) = match claims {
        CredentialClaims::Donation {
            donation_amount,
            donation_count,
            campaign_id,
            tx_hash,
            timestamp,
        } => (
            CredentialKind::Donation,
            CredentialSubject::Donation(DonationSubject {
                id: subject_did.to_string(),
                donation_amount,
                donation_count,
                campaign_id,
                tx_hash,
                timestamp,
            }),
        ),
        CredentialClaims::Badge(badge) => (
            CredentialKind::Badge,
            CredentialSubject::Badge(BadgeSubject {
                id: subject_did.to_string(),
                badge,
            }),
        ),
    };

    let family_context = match kind {
        CredentialKind::Donation => DONATION_CREDENTIAL_CONTEXT,
        CredentialKind::Badge => BADGE_CREDENTIAL_CONTEXT,
    };

    VerifiableCredential {
        context: vec![CREDENTIALS_CONTEXT_V1.to_string(), family_context.to_string()],
        credential_type: vec![
            "VerifiableCredential".to_string(),
            kind.type_name().to_string(),
        ],
        issuer: issuer_did.to_string(),
        issuance_date: now_rfc3339(),
        credential_subject: subject,
        proof: None,
    }
}

/// Donation credential for `donor`, issued by the DID of `issuer`
pub fn create_donation_credential(
    donor: &Address,
    issuer: &Address,
    donation_amount: &str,
    donation_count: u64,
    campaign_id: &str,
    tx_hash: &str,
    chain_id: u64,
) -> VerifiableCredential {
    issue_credential(
        &create_did(donor, chain_id),
        &create_did(issuer, chain_id),
        CredentialClaims::Donation {
            donation_amount: donation_amount.to_string(),
            donation_count,
            campaign_id: campaign_id.to_string(),
            tx_hash: tx_hash.to_string(),
            timestamp: now_rfc3339(),
        },
    )
}

/// Badge credential for `owner`, issued by the DID of `issuer`
pub fn create_badge_credential(
    owner: &Address,
    issuer: &Address,
    badge: BadgeDescriptor,
    chain_id: u64,
) -> VerifiableCredential {
    issue_credential(
        &create_did(owner, chain_id),
        &create_did(issuer, chain_id),
        CredentialClaims::Badge(badge),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_donation_credential_contents() {
        let donor: Address = "0x0000000000000000000000000000000000000001".parse().unwrap();
        let issuer: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        let vc = create_donation_credential(&donor, &issuer, "10000000000000000", 3, "2", "0xfeed", 421614);

        assert_eq!(vc.context[0], "https://www.w3.org/2018/credentials/v1");
        assert_eq!(vc.context[1], "https://www.donation-village.org/credentials/v1");
        assert_eq!(vc.credential_type, vec!["VerifiableCredential", "DonationCredential"]);
        assert_eq!(vc.issuer, "did:ethr:arbitrum-sepolia:0x00000000000000000000000000000000000000aa");
        assert_eq!(vc.subject_did(), "did:ethr:arbitrum-sepolia:0x0000000000000000000000000000000000000001");
        assert_eq!(vc.kind(), CredentialKind::Donation);
        assert!(!vc.is_signed());
    }

    #[test]
    fn test_badge_credential_contents() {
        let badge = BadgeDescriptor {
            name: "First Donation".to_string(),
            tier: "bronze".to_string(),
            description: "Made a first donation".to_string(),
            criteria: "1 donation".to_string(),
            image_url: "https://example.org/first.png".to_string(),
        };
        let vc = create_badge_credential(&Address::ZERO, &Address::ZERO, badge, 42161);
        assert_eq!(vc.credential_type[1], "BadgeCredential");
        assert_eq!(vc.context[1], "https://www.donation-village.org/credentials/badge/v1");
        assert!(vc.issuer.starts_with("did:ethr:arbitrum:"));
    }

    #[test]
    fn test_issuance_date_format() {
        let stamp = now_rfc3339();
        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
