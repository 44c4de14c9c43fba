//! Credential issuance after a verified donation

use lib_economy::badge;
use lib_identity::{
    create_badge_credential, create_donation_credential, sign_credential, BadgeDescriptor,
    VerifiableCredential,
};
use lib_storage::{Donation, UserRecord};
use tracing::{debug, warn};

use crate::context::AppContext;

/// Issue, sign when possible, and store the donation credential plus one
/// credential per newly awarded badge
///
/// Failures are logged and skipped; the credit itself is already recorded.
pub async fn issue_donation_credentials(
    ctx: &AppContext,
    user: &UserRecord,
    donation: &Donation,
    new_badges: &[String],
) -> Vec<VerifiableCredential> {
    let Some(issuer) = ctx.issuer_address() else {
        debug!("No issuer available, skipping credentials");
        return Vec::new();
    };
    let chain_id = ctx.chain_id();

    let mut issued = vec![create_donation_credential(
        &user.wallet_address,
        &issuer,
        &donation.amount.to_string(),
        user.donation_count,
        &donation.campaign_id,
        &donation.tx_hash,
        chain_id,
    )];

    for id in new_badges {
        let Some(definition) = badge(id) else {
            continue;
        };
        let descriptor = BadgeDescriptor {
            name: definition.name.to_string(),
            tier: definition.tier.to_string(),
            description: definition.description.to_string(),
            criteria: definition.criteria.to_string(),
            image_url: definition.image_path(),
        };
        issued.push(create_badge_credential(
            &user.wallet_address,
            &issuer,
            descriptor,
            chain_id,
        ));
    }

    let mut stored = Vec::with_capacity(issued.len());
    for credential in issued {
        let credential = match &ctx.issuer {
            Some(keypair) => match sign_credential(&credential, keypair) {
                Ok(signed) => signed,
                Err(e) => {
                    warn!(error = %e, "Credential signing failed, storing unsigned");
                    credential
                }
            },
            None => credential,
        };

        let did = credential.subject_did().to_string();
        match ctx.store.append_credential(&did, &credential).await {
            Ok(()) => stored.push(credential),
            Err(e) => warn!(did = %did, error = %e, "Failed to store credential"),
        }
    }
    debug!(count = stored.len(), "Credentials issued");
    stored
}
