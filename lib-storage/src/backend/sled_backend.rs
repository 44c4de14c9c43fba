//! Sled-based village store
//!
//! One tree per table, values are JSON-encoded records.
//!
//! - `users`: lower-cased address -> `UserRecord`
//! - `campaigns`: id -> `Campaign`
//! - `donations`: lower-cased tx hash -> `Donation`
//! - `credentials`: did || 0x00 || monotonic id (big endian) -> `CredentialRow`
//!
//! All sled calls run inside `spawn_blocking`. Conditional updates use sled's
//! own compare-and-swap on the previously read bytes, so the version check and
//! the write are one atomic step.

use std::path::Path;

use async_trait::async_trait;
use lib_crypto::Address;
use lib_identity::VerifiableCredential;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::traits::VillageStore;
use crate::errors::{Result, StorageError};
use crate::types::records::now_rfc3339;
use crate::types::{Campaign, CredentialRow, Donation, UserRecord};

// ============================================================================
// Constants
// ============================================================================

/// Default cache capacity (16 MB)
pub const DEFAULT_CACHE_CAPACITY: u64 = 16 * 1024 * 1024;

const USERS_TREE: &str = "users";
const CAMPAIGNS_TREE: &str = "campaigns";
const DONATIONS_TREE: &str = "donations";
const CREDENTIALS_TREE: &str = "credentials";

// ============================================================================
// Helpers
// ============================================================================

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn credential_prefix(did: &str) -> Vec<u8> {
    let mut prefix = did.as_bytes().to_vec();
    prefix.push(0);
    prefix
}

/// Run a blocking sled closure on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::TaskFailed(e.to_string()))?
}

/// Versioned compare-and-swap of a JSON record in `tree`
fn cas_record<T>(
    tree: &sled::Tree,
    key: &[u8],
    expected_version: u64,
    next: &T,
    version_of: fn(&T) -> u64,
) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let current = tree
        .get(key)
        .map_err(|e| StorageError::ReadFailed(e.to_string()))?
        .ok_or(StorageError::CasConflict)?;
    let stored: T = decode(&current)?;
    if version_of(&stored) != expected_version {
        return Err(StorageError::CasConflict);
    }

    let bytes = encode(next)?;
    match tree
        .compare_and_swap(key, Some(current), Some(bytes))
        .map_err(|e| StorageError::WriteFailed(e.to_string()))?
    {
        Ok(()) => Ok(()),
        Err(_) => Err(StorageError::CasConflict),
    }
}

// ============================================================================
// Local Store
// ============================================================================

/// Embedded store used when no hosted database is configured
#[derive(Clone, Debug)]
pub struct LocalStore {
    db: sled::Db,
    users: sled::Tree,
    campaigns: sled::Tree,
    donations: sled::Tree,
    credentials: sled::Tree,
}

impl LocalStore {
    /// Open or create a store at the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, DEFAULT_CACHE_CAPACITY)
    }

    /// Open with a custom page cache size
    pub fn open_with_config<P: AsRef<Path>>(path: P, cache_capacity: u64) -> Result<Self> {
        let db = sled::Config::default()
            .path(path.as_ref())
            .cache_capacity(cache_capacity)
            .open()
            .map_err(|e| StorageError::OpenFailed(e.to_string()))?;

        let open_tree = |name: &str| {
            db.open_tree(name)
                .map_err(|e| StorageError::TreeFailed(e.to_string()))
        };
        let store = Self {
            users: open_tree(USERS_TREE)?,
            campaigns: open_tree(CAMPAIGNS_TREE)?,
            donations: open_tree(DONATIONS_TREE)?,
            credentials: open_tree(CREDENTIALS_TREE)?,
            db,
        };

        info!(
            "Opened local village store at {:?} with {}MB cache",
            path.as_ref(),
            cache_capacity / (1024 * 1024)
        );
        Ok(store)
    }

    /// Flush all pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        let db = self.db.clone();
        blocking(move || {
            db.flush()
                .map(|_| ())
                .map_err(|e| StorageError::WriteFailed(e.to_string()))
        })
        .await
    }

    async fn scan_tree<T>(tree: sled::Tree) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        blocking(move || {
            let mut out = Vec::new();
            for item in tree.iter() {
                let (_, value) = item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
                out.push(decode(&value)?);
            }
            Ok(out)
        })
        .await
    }
}

#[async_trait]
impl VillageStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn get_user(&self, address: &Address) -> Result<Option<UserRecord>> {
        let tree = self.users.clone();
        let key = address.to_lowercase_hex();
        blocking(move || {
            tree.get(key.as_bytes())
                .map_err(|e| StorageError::ReadFailed(e.to_string()))?
                .map(|bytes| decode(&bytes))
                .transpose()
        })
        .await
    }

    async fn create_user_if_absent(&self, user: &UserRecord) -> Result<UserRecord> {
        let tree = self.users.clone();
        let key = user.key();
        let mut fresh = user.clone();
        fresh.version = 0;
        blocking(move || {
            let bytes = encode(&fresh)?;
            let outcome = tree
                .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(bytes))
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            match outcome {
                Ok(()) => {
                    debug!(address = %key, "Created user");
                    Ok(fresh)
                }
                Err(existing) => match existing.current {
                    Some(bytes) => decode(&bytes),
                    None => Err(StorageError::CasConflict),
                },
            }
        })
        .await
    }

    async fn compare_and_swap_user(
        &self,
        expected_version: u64,
        updated: &UserRecord,
    ) -> Result<UserRecord> {
        let tree = self.users.clone();
        let key = updated.key();
        let mut next = updated.clone();
        next.version = expected_version + 1;
        blocking(move || {
            cas_record(&tree, key.as_bytes(), expected_version, &next, |u: &UserRecord| u.version)?;
            Ok(next)
        })
        .await
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = Self::scan_tree(self.campaigns.clone()).await?;
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }

    async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let tree = self.campaigns.clone();
        let key = id.to_string();
        blocking(move || {
            tree.get(key.as_bytes())
                .map_err(|e| StorageError::ReadFailed(e.to_string()))?
                .map(|bytes| decode(&bytes))
                .transpose()
        })
        .await
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<Campaign> {
        let tree = self.campaigns.clone();
        let stored = campaign.clone();
        blocking(move || {
            let bytes = encode(&stored)?;
            let outcome = tree
                .compare_and_swap(stored.id.as_bytes(), None as Option<&[u8]>, Some(bytes))
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            match outcome {
                Ok(()) => Ok(stored),
                Err(_) => Err(StorageError::WriteFailed(format!(
                    "campaign id already exists: {}",
                    stored.id
                ))),
            }
        })
        .await
    }

    async fn compare_and_swap_campaign(
        &self,
        expected_version: u64,
        updated: &Campaign,
    ) -> Result<Campaign> {
        let tree = self.campaigns.clone();
        let mut next = updated.clone();
        next.version = expected_version + 1;
        blocking(move || {
            cas_record(&tree, next.id.as_bytes(), expected_version, &next, |c: &Campaign| c.version)?;
            Ok(next)
        })
        .await
    }

    async fn delete_campaign(&self, id: &str) -> Result<bool> {
        let tree = self.campaigns.clone();
        let key = id.to_string();
        blocking(move || {
            tree.remove(key.as_bytes())
                .map(|old| old.is_some())
                .map_err(|e| StorageError::DeleteFailed(e.to_string()))
        })
        .await
    }

    async fn insert_donation_if_absent(&self, donation: &Donation) -> Result<bool> {
        let tree = self.donations.clone();
        let key = donation.tx_hash.to_lowercase();
        let row = donation.clone();
        blocking(move || {
            let bytes = encode(&row)?;
            let outcome = tree
                .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(bytes))
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            Ok(outcome.is_ok())
        })
        .await
    }

    async fn get_donation_by_tx(&self, tx_hash: &str) -> Result<Option<Donation>> {
        let tree = self.donations.clone();
        let key = tx_hash.to_lowercase();
        blocking(move || {
            tree.get(key.as_bytes())
                .map_err(|e| StorageError::ReadFailed(e.to_string()))?
                .map(|bytes| decode(&bytes))
                .transpose()
        })
        .await
    }

    async fn mark_donation_credited(&self, tx_hash: &str) -> Result<bool> {
        let tree = self.donations.clone();
        let key = tx_hash.to_lowercase();
        blocking(move || loop {
            let current = tree
                .get(key.as_bytes())
                .map_err(|e| StorageError::ReadFailed(e.to_string()))?
                .ok_or_else(|| StorageError::NotFound {
                    kind: "donation",
                    id: key.clone(),
                })?;
            let mut donation: Donation = decode(&current)?;
            if donation.credited {
                return Ok(false);
            }
            donation.credited = true;
            let outcome = tree
                .compare_and_swap(key.as_bytes(), Some(&current), Some(encode(&donation)?))
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            if outcome.is_ok() {
                debug!(tx_hash = %key, "Donation marked credited");
                return Ok(true);
            }
        })
        .await
    }

    async fn list_donations_for_campaign(&self, campaign_id: &str) -> Result<Vec<Donation>> {
        let all: Vec<Donation> = Self::scan_tree(self.donations.clone()).await?;
        let mut matching: Vec<Donation> =
            all.into_iter().filter(|d| d.campaign_id == campaign_id).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn list_donations_for_donor(&self, donor: &Address) -> Result<Vec<Donation>> {
        let all: Vec<Donation> = Self::scan_tree(self.donations.clone()).await?;
        let mut matching: Vec<Donation> =
            all.into_iter().filter(|d| &d.donor_address == donor).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn append_credential(&self, did: &str, credential: &VerifiableCredential) -> Result<()> {
        let db = self.db.clone();
        let tree = self.credentials.clone();
        let row = CredentialRow {
            did: did.to_string(),
            credential: credential.clone(),
            created_at: now_rfc3339(),
        };
        blocking(move || {
            let id = db
                .generate_id()
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            let mut key = credential_prefix(&row.did);
            key.extend_from_slice(&id.to_be_bytes());
            tree.insert(key, encode(&row)?)
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn list_credentials(&self, did: &str) -> Result<Vec<VerifiableCredential>> {
        let tree = self.credentials.clone();
        let prefix = credential_prefix(did);
        blocking(move || {
            let mut out = Vec::new();
            for item in tree.scan_prefix(prefix) {
                let (_, value) = item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
                let row: CredentialRow = decode(&value)?;
                out.push(row.credential);
            }
            Ok(out)
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lib_economy::Category;
    use lib_identity::{create_donation_credential, WalletType};
    use tempfile::TempDir;

    fn create_test_store() -> (LocalStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::open(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    fn test_user(byte: u8) -> UserRecord {
        let address = Address([byte; 20]);
        UserRecord::new(
            address,
            format!("user{}@example.com", byte),
            None,
            lib_identity::create_did(&address, 421614),
            WalletType::Embedded,
            false,
        )
    }

    fn test_donation(tx: &str, campaign_id: &str, donor: Address) -> Donation {
        Donation {
            id: uuid::Uuid::new_v4().to_string(),
            campaign_id: campaign_id.to_string(),
            donor_address: donor,
            amount: 10_000_000_000_000_000,
            krw_amount: 30_000,
            message: String::new(),
            tx_hash: tx.to_string(),
            onchain_donation_id: Some("1".to_string()),
            category: Some(Category::Environment),
            certificate_url: None,
            created_at: now_rfc3339(),
            credited: false,
        }
    }

    #[tokio::test]
    async fn test_create_user_if_absent_keeps_first() {
        let (store, _dir) = create_test_store();
        let user = test_user(1);

        let created = store.create_user_if_absent(&user).await.unwrap();
        assert_eq!(created.version, 0);

        let mut other = user.clone();
        other.email = "someone-else@example.com".to_string();
        let existing = store.create_user_if_absent(&other).await.unwrap();
        assert_eq!(existing.email, user.email);
    }

    #[tokio::test]
    async fn test_get_user_is_case_insensitive_on_address() {
        let (store, _dir) = create_test_store();
        let user = test_user(0xab);
        store.create_user_if_absent(&user).await.unwrap();

        let upper: Address = "0xABABABABABABABABABABABABABABABABABABABAB".parse().unwrap();
        assert!(store.get_user(&upper).await.unwrap().is_some());
        assert!(store.get_user(&Address([2; 20])).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_cas_success_bumps_version() {
        let (store, _dir) = create_test_store();
        let mut user = store.create_user_if_absent(&test_user(1)).await.unwrap();

        user.points = 500;
        let stored = store.compare_and_swap_user(0, &user).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(store.get_user(&user.wallet_address).await.unwrap().unwrap().points, 500);
    }

    #[tokio::test]
    async fn test_user_cas_conflict_on_stale_version() {
        let (store, _dir) = create_test_store();
        let mut user = store.create_user_if_absent(&test_user(1)).await.unwrap();
        user.points = 1;
        store.compare_and_swap_user(0, &user).await.unwrap();

        user.points = 2;
        let result = store.compare_and_swap_user(0, &user).await;
        assert!(matches!(result, Err(StorageError::CasConflict)));
        assert_eq!(store.get_user(&user.wallet_address).await.unwrap().unwrap().points, 1);
    }

    #[tokio::test]
    async fn test_user_cas_on_missing_user_conflicts() {
        let (store, _dir) = create_test_store();
        let result = store.compare_and_swap_user(0, &test_user(9)).await;
        assert!(matches!(result, Err(StorageError::CasConflict)));
    }

    #[tokio::test]
    async fn test_donation_insert_is_idempotent() {
        let (store, _dir) = create_test_store();
        let donation = test_donation("0xAAAA", "c1", Address([1; 20]));

        assert!(store.insert_donation_if_absent(&donation).await.unwrap());
        let mut replay = donation.clone();
        replay.tx_hash = "0xaaaa".to_string();
        assert!(!store.insert_donation_if_absent(&replay).await.unwrap());

        let fetched = store.get_donation_by_tx("0xaaaa").await.unwrap().unwrap();
        assert_eq!(fetched.id, donation.id);
    }

    #[tokio::test]
    async fn test_mark_donation_credited_flips_once() {
        let (store, _dir) = create_test_store();
        store
            .insert_donation_if_absent(&test_donation("0xBBBB", "c1", Address([1; 20])))
            .await
            .unwrap();

        assert!(store.mark_donation_credited("0xbbbb").await.unwrap());
        assert!(!store.mark_donation_credited("0xBBBB").await.unwrap());
        assert!(store.get_donation_by_tx("0xbbbb").await.unwrap().unwrap().credited);

        let missing = store.mark_donation_credited("0xcccc").await;
        assert!(matches!(missing, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_donation_listings() {
        let (store, _dir) = create_test_store();
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);
        store.insert_donation_if_absent(&test_donation("0x01", "c1", alice)).await.unwrap();
        store.insert_donation_if_absent(&test_donation("0x02", "c1", bob)).await.unwrap();
        store.insert_donation_if_absent(&test_donation("0x03", "c2", alice)).await.unwrap();

        assert_eq!(store.list_donations_for_campaign("c1").await.unwrap().len(), 2);
        assert_eq!(store.list_donations_for_donor(&alice).await.unwrap().len(), 2);
        assert!(store.list_donations_for_campaign("none").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credentials_append_in_order_per_did() {
        let (store, _dir) = create_test_store();
        let donor = Address([1; 20]);
        let issuer = Address([9; 20]);
        let did = lib_identity::create_did(&donor, 421614);

        for count in 1..=3u64 {
            let vc = create_donation_credential(&donor, &issuer, "1", count, "c1", "0x01", 421614);
            store.append_credential(&did, &vc).await.unwrap();
        }
        let other = lib_identity::create_did(&Address([2; 20]), 421614);
        let vc = create_donation_credential(&Address([2; 20]), &issuer, "1", 1, "c1", "0x02", 421614);
        store.append_credential(&other, &vc).await.unwrap();

        let listed = store.list_credentials(&did).await.unwrap();
        assert_eq!(listed.len(), 3);
        let counts: Vec<u64> = listed
            .iter()
            .map(|vc| match &vc.credential_subject {
                lib_identity::CredentialSubject::Donation(s) => s.donation_count,
                _ => 0,
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = LocalStore::open(temp_dir.path()).unwrap();
            store.create_user_if_absent(&test_user(7)).await.unwrap();
            store.flush().await.unwrap();
        }
        let store = LocalStore::open(temp_dir.path()).unwrap();
        assert!(store.get_user(&Address([7; 20])).await.unwrap().is_some());
    }
}
