//! Verify a donation transaction and credit the donor exactly once

use lib_blockchain::{find_donation_event, tx_explorer_url, DonationMadeEvent, TxHash};
use lib_crypto::Address;
use lib_economy::{award_badges, badge, points_for_wei, wei_to_krw};
use lib_storage::{
    increase_campaign_amount, retry_cas, Campaign, Donation, StorageError, UserRecord, VillageStore,
};
use tracing::{debug, info, warn};

use super::credentials::issue_donation_credentials;
use super::{BadgeAward, DonationCredit, DonationError, VerificationResult};
use crate::accounts::ensure_user;
use crate::context::AppContext;

/// Verify `tx_hash` as a donation by `donor`
///
/// Both arguments are raw request strings. The donation row is inserted
/// uncredited, then the donor's points and the campaign amount are applied
/// and the row is marked credited. Each of those writes records the
/// transaction hash, so a call that finds an uncredited row finishes the
/// credit without repeating what already landed. Only the call that marks
/// the row credited reports `Success`.
pub async fn verify_donation(
    ctx: &AppContext,
    tx_hash: &str,
    donor: &str,
) -> Result<VerificationResult, DonationError> {
    let hash: TxHash = tx_hash
        .trim()
        .parse()
        .map_err(|_| DonationError::InvalidInput(format!("not a transaction hash: {}", tx_hash)))?;
    let claimed: Address = donor
        .trim()
        .parse()
        .map_err(|_| DonationError::InvalidInput(format!("not an address: {}", donor)))?;
    let contract = ctx.contract().ok_or(DonationError::ContractNotDeployed)?;
    let tx_key = hash.to_hex();

    info!(tx = %tx_key, donor = %claimed, "Verifying donation");

    match ctx.store.get_donation_by_tx(&tx_key).await? {
        Some(existing) if existing.credited => {
            debug!(tx = %tx_key, "Donation already recorded");
            return Ok(VerificationResult::AlreadyVerified);
        }
        Some(_) => debug!(tx = %tx_key, "Resuming credit for recorded donation"),
        None => {}
    }

    let Some(receipt) = ctx.chain.get_transaction_receipt(&hash).await? else {
        return Ok(VerificationResult::Pending);
    };
    if !receipt.is_success() {
        warn!(tx = %tx_key, "Donation transaction reverted");
        return Ok(VerificationResult::Failed);
    }

    let Some(event) = find_donation_event(&receipt, Some(&contract)) else {
        warn!(tx = %tx_key, contract = %contract, "No DonationMade event in receipt");
        return Ok(VerificationResult::NoDonationEvent);
    };
    if !event.is_from(&claimed) {
        warn!(tx = %tx_key, claimed = %claimed, actual = %event.donor, "Donor address mismatch");
        return Ok(VerificationResult::Mismatch {
            claimed,
            actual: event.donor,
        });
    }

    let campaign = resolve_campaign(ctx.store.as_ref(), event.campaign_id).await?;
    let row = donation_row(&tx_key, &event, campaign.as_ref());
    let donation = if ctx.store.insert_donation_if_absent(&row).await? {
        row
    } else {
        // Another call wrote the row first; credit from what it stored
        ctx.store
            .get_donation_by_tx(&tx_key)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                kind: "donation",
                id: tx_key.clone(),
            })?
    };
    if donation.credited {
        return Ok(VerificationResult::AlreadyVerified);
    }

    let points = points_for_wei(donation.amount);
    ensure_user(ctx.store.as_ref(), &claimed, ctx.chain_id()).await?;
    let credit = credit_donor(ctx.store.as_ref(), &claimed, &donation, points).await?;
    if credit.applied {
        issue_donation_credentials(ctx, &credit.user, &donation, &credit.new_badges).await;
    }

    // Matched campaigns are the ones the row carries a category for
    if donation.category.is_some() {
        increase_campaign_amount(
            ctx.store.as_ref(),
            &donation.campaign_id,
            &tx_key,
            donation.krw_amount,
        )
        .await
        .map_err(|e| DonationError::from_retry(e.into()))?;
    }

    if !ctx.store.mark_donation_credited(&tx_key).await? {
        debug!(tx = %tx_key, "Concurrent call finished the credit");
        return Ok(VerificationResult::AlreadyVerified);
    }

    info!(
        tx = %tx_key,
        donor = %claimed,
        points,
        total_points = credit.user.points,
        new_badges = credit.new_badges.len(),
        "Donation verified"
    );

    Ok(VerificationResult::Success(DonationCredit {
        tx_hash: tx_key.clone(),
        points,
        total_points: credit.user.points,
        donation_count: credit.user.donation_count,
        new_badges: credit
            .new_badges
            .iter()
            .filter_map(|id| badge(id))
            .map(|b| BadgeAward {
                id: b.id.to_string(),
                name: b.name.to_string(),
            })
            .collect(),
        campaign_id: campaign.map(|c| c.id),
        krw_amount: donation.krw_amount,
        explorer_url: tx_explorer_url(&ctx.config.chain.explorer_base, &tx_key),
    }))
}

/// Local campaign for an on-chain campaign id
///
/// Matches `onchain_id` first, then a campaign whose id is the decimal id.
async fn resolve_campaign(
    store: &dyn VillageStore,
    onchain_id: u128,
) -> Result<Option<Campaign>, StorageError> {
    if let Ok(id) = u64::try_from(onchain_id) {
        let campaigns = store.list_campaigns().await?;
        if let Some(found) = campaigns.into_iter().find(|c| c.onchain_id == Some(id)) {
            return Ok(Some(found));
        }
    }
    store.get_campaign(&onchain_id.to_string()).await
}

fn donation_row(tx_key: &str, event: &DonationMadeEvent, campaign: Option<&Campaign>) -> Donation {
    // Unmatched campaigns get no KRW credit so audits stay consistent
    let krw_amount = campaign.map_or(0, |_| wei_to_krw(event.amount));
    Donation {
        id: uuid::Uuid::new_v4().to_string(),
        campaign_id: campaign
            .map(|c| c.id.clone())
            .unwrap_or_else(|| event.campaign_id.to_string()),
        donor_address: event.donor,
        amount: event.amount,
        krw_amount,
        message: String::new(),
        tx_hash: tx_key.to_string(),
        onchain_donation_id: Some(event.donation_id.to_string()),
        category: campaign.map(|c| c.category),
        certificate_url: None,
        credited: false,
        created_at: chrono::DateTime::from_timestamp(event.timestamp as i64, 0)
            .unwrap_or_else(chrono::Utc::now)
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }
}

struct DonorCredit {
    user: UserRecord,
    /// Ids of badges awarded by this credit
    new_badges: Vec<String>,
    /// `false` when an earlier call already applied the credit
    applied: bool,
}

/// Add points and counts, then award badges, in one conditional update
///
/// The transaction hash is stored on the user in the same write and checked
/// before applying, so the credit lands at most once per transaction.
async fn credit_donor(
    store: &dyn VillageStore,
    donor: &Address,
    donation: &Donation,
    points: u64,
) -> Result<DonorCredit, DonationError> {
    retry_cas(|| async move {
        let mut user = store
            .get_user(donor)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                kind: "user",
                id: donor.to_lowercase_hex(),
            })?;
        if user.has_credited(&donation.tx_hash) {
            return Ok(DonorCredit {
                user,
                new_badges: Vec::new(),
                applied: false,
            });
        }
        let expected = user.version;

        user.points = user.points.saturating_add(points);
        user.donation_count += 1;
        if let Some(category) = donation.category {
            user.category_counts.increment(category);
        }
        user.credited_tx_hashes.push(donation.tx_hash.to_lowercase());
        let stats = user.stats();
        let new_badges: Vec<String> = award_badges(&stats, &mut user.badges)
            .into_iter()
            .map(|b| b.id.to_string())
            .collect();

        let stored = store.compare_and_swap_user(expected, &user).await?;
        Ok::<_, DonationError>(DonorCredit {
            user: stored,
            new_badges,
            applied: true,
        })
    })
    .await
    .map_err(DonationError::from_retry)
}
