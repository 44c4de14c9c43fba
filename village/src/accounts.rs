//! User account bookkeeping
//!
//! Users are created on first login or on their first verified donation,
//! whichever comes first, and never deleted.

use lib_crypto::Address;
use lib_identity::constants::{METAMASK_DISPLAY_NAME, METAMASK_EMAIL_SUFFIX};
use lib_identity::{create_did, Session, WalletType};
use lib_storage::{Donation, StorageError, UserRecord, VillageStore};
use serde::Serialize;
use tracing::info;

/// Record the user behind a fresh login session
pub async fn register_session(
    store: &dyn VillageStore,
    session: &Session,
) -> Result<UserRecord, StorageError> {
    let user = store
        .create_user_if_absent(&UserRecord::from_profile(&session.profile))
        .await?;
    info!(address = %user.wallet_address, wallet_type = %user.wallet_type, "Session registered");
    Ok(user)
}

/// Existing user for an address, or a new external-wallet record
///
/// A donor seen only on chain has no email; the record gets the same
/// placeholder identity a MetaMask login would.
pub async fn ensure_user(
    store: &dyn VillageStore,
    address: &Address,
    chain_id: u64,
) -> Result<UserRecord, StorageError> {
    if let Some(user) = store.get_user(address).await? {
        return Ok(user);
    }
    let placeholder = UserRecord::new(
        *address,
        format!("{}{}", address.to_lowercase_hex(), METAMASK_EMAIL_SUFFIX),
        Some(METAMASK_DISPLAY_NAME.to_string()),
        create_did(address, chain_id),
        WalletType::Metamask,
        false,
    );
    store.create_user_if_absent(&placeholder).await
}

/// Public view of a user, as served by `GET /user/:address`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub address: String,
    pub did: Option<String>,
    pub points: u64,
    pub donation_count: u64,
    pub badges: Vec<String>,
    pub furniture: Vec<String>,
    pub donations: Vec<DonationSummary>,
}

/// One entry of a user's donation history
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DonationSummary {
    pub tx_hash: String,
    pub campaign_id: String,
    /// Wei, decimal
    pub amount: String,
    pub timestamp: String,
    pub donation_index: Option<String>,
}

impl From<&Donation> for DonationSummary {
    fn from(donation: &Donation) -> Self {
        Self {
            tx_hash: donation.tx_hash.clone(),
            campaign_id: donation.campaign_id.clone(),
            amount: donation.amount.to_string(),
            timestamp: donation.created_at.clone(),
            donation_index: donation.onchain_donation_id.clone(),
        }
    }
}

/// Summary for an address; unknown addresses get an empty summary
pub async fn user_summary(
    store: &dyn VillageStore,
    address: &Address,
) -> Result<UserSummary, StorageError> {
    let user = store.get_user(address).await?;
    let donations = store.list_donations_for_donor(address).await?;

    Ok(match user {
        Some(user) => UserSummary {
            address: user.key(),
            did: Some(user.did),
            points: user.points,
            donation_count: user.donation_count,
            badges: user.badges,
            furniture: user.furniture,
            donations: donations.iter().map(DonationSummary::from).collect(),
        },
        None => UserSummary {
            address: address.to_lowercase_hex(),
            did: None,
            points: 0,
            donation_count: 0,
            badges: Vec::new(),
            furniture: Vec::new(),
            donations: donations.iter().map(DonationSummary::from).collect(),
        },
    })
}
