//! Read-modify-write operations on top of `VillageStore`
//!
//! Every mutation of a shared record goes through `retry_cas`: read, modify,
//! conditional write, and on a lost race back off and start again from a
//! fresh read. After `MAX_CAS_ATTEMPTS` lost races the conflict is returned.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::backend::VillageStore;
use crate::errors::{Result, StorageError};
use crate::types::{Campaign, CampaignAudit, CampaignUpdate, NewCampaign};

/// Attempts before a conditional update gives up
pub const MAX_CAS_ATTEMPTS: u32 = 8;

/// Base backoff between attempts (doubled per attempt, plus jitter)
pub const CAS_BACKOFF_BASE: Duration = Duration::from_millis(2);

/// Errors that can report a lost compare-and-swap race
pub trait CasRetryable {
    fn is_cas_conflict(&self) -> bool;
}

impl CasRetryable for StorageError {
    fn is_cas_conflict(&self) -> bool {
        matches!(self, StorageError::CasConflict)
    }
}

/// Run `op` until it succeeds, fails with a non-conflict error, or runs out of attempts
pub async fn retry_cas<T, E, F, Fut>(mut op: F) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: CasRetryable,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.is_cas_conflict() && attempt + 1 < MAX_CAS_ATTEMPTS => {
                let base = CAS_BACKOFF_BASE.as_millis() as u64 * (1u64 << attempt);
                let jitter = rand::thread_rng().gen_range(0..=base);
                debug!(attempt, "Conditional update conflict, retrying");
                tokio::time::sleep(Duration::from_millis(base + jitter)).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_cas_conflict() {
                    warn!(attempts = MAX_CAS_ATTEMPTS, "Conditional update retries exhausted");
                }
                return Err(e);
            }
            Ok(value) => return Ok(value),
        }
    }
}

fn validate_new_campaign(campaign: &NewCampaign) -> Result<()> {
    if campaign.title.trim().is_empty() {
        return Err(StorageError::InvalidRecord("campaign title is empty".to_string()));
    }
    if campaign.organization_name.trim().is_empty() {
        return Err(StorageError::InvalidRecord(
            "campaign organization name is empty".to_string(),
        ));
    }
    if campaign.goal_amount == 0 {
        return Err(StorageError::InvalidRecord("campaign goal must be positive".to_string()));
    }
    Ok(())
}

/// Create a campaign (admin)
pub async fn create_campaign<S: VillageStore + ?Sized>(
    store: &S,
    campaign: NewCampaign,
) -> Result<Campaign> {
    validate_new_campaign(&campaign)?;
    let created = store.insert_campaign(&campaign.into_campaign()).await?;
    info!(campaign_id = %created.id, title = %created.title, "Campaign created");
    Ok(created)
}

/// Apply an admin edit (admin)
pub async fn update_campaign<S: VillageStore + ?Sized>(
    store: &S,
    id: &str,
    update: &CampaignUpdate,
) -> Result<Campaign> {
    if matches!(update.goal_amount, Some(0)) {
        return Err(StorageError::InvalidRecord("campaign goal must be positive".to_string()));
    }
    retry_cas(|| async move {
        let mut campaign = load_campaign(store, id).await?;
        let expected = campaign.version;
        update.apply(&mut campaign);
        store.compare_and_swap_campaign(expected, &campaign).await
    })
    .await
}

/// Delete a campaign (admin)
pub async fn delete_campaign<S: VillageStore + ?Sized>(store: &S, id: &str) -> Result<()> {
    if store.delete_campaign(id).await? {
        info!(campaign_id = %id, "Campaign deleted");
        Ok(())
    } else {
        Err(StorageError::NotFound {
            kind: "campaign",
            id: id.to_string(),
        })
    }
}

/// Add a verified donation's KRW value to a campaign
///
/// The transaction hash is recorded on the campaign in the same write, so a
/// repeated call for the same transaction returns `false` and leaves the
/// amount alone.
pub async fn increase_campaign_amount<S: VillageStore + ?Sized>(
    store: &S,
    id: &str,
    tx_hash: &str,
    krw: u64,
) -> Result<bool> {
    retry_cas(|| async move {
        let mut campaign = load_campaign(store, id).await?;
        if campaign.has_credited(tx_hash) {
            debug!(campaign = %id, tx_hash, "Campaign already includes donation");
            return Ok(false);
        }
        let expected = campaign.version;
        campaign.current_amount = campaign.current_amount.saturating_add(krw);
        campaign.credited_tx_hashes.push(tx_hash.to_lowercase());
        store.compare_and_swap_campaign(expected, &campaign).await?;
        Ok::<_, StorageError>(true)
    })
    .await
}

/// Compare a campaign's amount with the donations recorded against it
pub async fn campaign_audit<S: VillageStore + ?Sized>(store: &S, id: &str) -> Result<CampaignAudit> {
    let campaign = load_campaign(store, id).await?;
    let donations = store.list_donations_for_campaign(id).await?;
    let credited_amount = donations
        .iter()
        .fold(0u64, |sum, d| sum.saturating_add(d.krw_amount));

    let audit = CampaignAudit {
        campaign_id: campaign.id,
        opening_amount: campaign.opening_amount,
        credited_amount,
        current_amount: campaign.current_amount,
        donation_count: donations.len(),
    };
    if !audit.is_consistent() {
        warn!(
            campaign_id = %audit.campaign_id,
            current = audit.current_amount,
            explained = audit.opening_amount.saturating_add(audit.credited_amount),
            "Campaign amount exceeds recorded donations"
        );
    }
    Ok(audit)
}

async fn load_campaign<S: VillageStore + ?Sized>(store: &S, id: &str) -> Result<Campaign> {
    store
        .get_campaign(id)
        .await?
        .ok_or_else(|| StorageError::NotFound {
            kind: "campaign",
            id: id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_cas_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_cas(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::CasConflict)
        })
        .await;
        assert!(matches!(result, Err(StorageError::CasConflict)));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_CAS_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_retry_cas_does_not_retry_other_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_cas(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::ReadFailed("boom".to_string()))
        })
        .await;
        assert!(matches!(result, Err(StorageError::ReadFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_cas_recovers_after_conflicts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32> = retry_cas(|| async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(StorageError::CasConflict)
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }
}
