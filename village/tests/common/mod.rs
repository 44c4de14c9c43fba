//! Shared fixtures for service tests: a scripted chain client and an
//! `AppContext` over a temporary embedded store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lib_blockchain::types::u128_to_word;
use lib_blockchain::{
    donation_made_topic, ChainClient, ChainResult, Log, TransactionReceipt, TransactionStatus,
    TxHash, DEFAULT_CONTRACT_ADDRESS,
};
use lib_crypto::{Address, KeyPair};
use lib_economy::Category;
use lib_identity::VerifiableCredential;
use lib_storage::{
    create_campaign, Campaign, Donation, LocalStore, NewCampaign, StorageError, UserRecord,
    VillageStore,
};
use tempfile::TempDir;
use village::{AppContext, VillageConfig};

/// 0.01 ETH
pub const TEN_POINTS_WEI: u128 = 10_000_000_000_000_000;

/// Chain client answering from a fixed receipt table
///
/// Unknown hashes look like transactions that are not mined yet.
#[derive(Default)]
pub struct StubChain {
    receipts: Mutex<HashMap<TxHash, TransactionReceipt>>,
}

impl StubChain {
    pub fn insert(&self, receipt: TransactionReceipt) {
        if let Ok(mut receipts) = self.receipts.lock() {
            receipts.insert(receipt.tx_hash, receipt);
        }
    }
}

#[async_trait]
impl ChainClient for StubChain {
    async fn get_transaction_receipt(&self, hash: &TxHash) -> ChainResult<Option<TransactionReceipt>> {
        Ok(self
            .receipts
            .lock()
            .ok()
            .and_then(|receipts| receipts.get(hash).cloned()))
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(lib_blockchain::ARBITRUM_SEPOLIA_CHAIN_ID)
    }
}

/// Local store whose next few conditional updates fail with a write error
pub struct FlakyStore {
    inner: LocalStore,
    user_write_failures: AtomicU32,
    campaign_write_failures: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: LocalStore) -> Self {
        Self {
            inner,
            user_write_failures: AtomicU32::new(0),
            campaign_write_failures: AtomicU32::new(0),
        }
    }

    pub fn fail_user_writes(&self, count: u32) {
        self.user_write_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_campaign_writes(&self, count: u32) {
        self.campaign_write_failures.store(count, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> lib_storage::Result<()> {
        let armed = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            Err(StorageError::WriteFailed("connection reset by peer".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl VillageStore for FlakyStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn get_user(&self, address: &Address) -> lib_storage::Result<Option<UserRecord>> {
        self.inner.get_user(address).await
    }

    async fn create_user_if_absent(&self, user: &UserRecord) -> lib_storage::Result<UserRecord> {
        self.inner.create_user_if_absent(user).await
    }

    async fn compare_and_swap_user(
        &self,
        expected_version: u64,
        updated: &UserRecord,
    ) -> lib_storage::Result<UserRecord> {
        Self::take_failure(&self.user_write_failures)?;
        self.inner.compare_and_swap_user(expected_version, updated).await
    }

    async fn list_campaigns(&self) -> lib_storage::Result<Vec<Campaign>> {
        self.inner.list_campaigns().await
    }

    async fn get_campaign(&self, id: &str) -> lib_storage::Result<Option<Campaign>> {
        self.inner.get_campaign(id).await
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> lib_storage::Result<Campaign> {
        self.inner.insert_campaign(campaign).await
    }

    async fn compare_and_swap_campaign(
        &self,
        expected_version: u64,
        updated: &Campaign,
    ) -> lib_storage::Result<Campaign> {
        Self::take_failure(&self.campaign_write_failures)?;
        self.inner.compare_and_swap_campaign(expected_version, updated).await
    }

    async fn delete_campaign(&self, id: &str) -> lib_storage::Result<bool> {
        self.inner.delete_campaign(id).await
    }

    async fn insert_donation_if_absent(&self, donation: &Donation) -> lib_storage::Result<bool> {
        self.inner.insert_donation_if_absent(donation).await
    }

    async fn get_donation_by_tx(&self, tx_hash: &str) -> lib_storage::Result<Option<Donation>> {
        self.inner.get_donation_by_tx(tx_hash).await
    }

    async fn mark_donation_credited(&self, tx_hash: &str) -> lib_storage::Result<bool> {
        self.inner.mark_donation_credited(tx_hash).await
    }

    async fn list_donations_for_campaign(&self, campaign_id: &str) -> lib_storage::Result<Vec<Donation>> {
        self.inner.list_donations_for_campaign(campaign_id).await
    }

    async fn list_donations_for_donor(&self, donor: &Address) -> lib_storage::Result<Vec<Donation>> {
        self.inner.list_donations_for_donor(donor).await
    }

    async fn append_credential(&self, did: &str, credential: &VerifiableCredential) -> lib_storage::Result<()> {
        self.inner.append_credential(did, credential).await
    }

    async fn list_credentials(&self, did: &str) -> lib_storage::Result<Vec<VerifiableCredential>> {
        self.inner.list_credentials(did).await
    }
}

pub struct TestVillage {
    pub ctx: Arc<AppContext>,
    pub chain: Arc<StubChain>,
    pub store: Arc<dyn VillageStore>,
    _dir: TempDir,
}

impl TestVillage {
    /// Context over the default deployment with an optional issuer key
    pub fn new(issuer: Option<KeyPair>) -> Self {
        Self::with_config(VillageConfig::default(), issuer)
    }

    pub fn with_config(config: VillageConfig, issuer: Option<KeyPair>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store: Arc<dyn VillageStore> =
            Arc::new(LocalStore::open(dir.path()).expect("Failed to open store"));
        Self::assemble(config, store, issuer, dir)
    }

    /// Context over a `FlakyStore`, returned alongside for arming failures
    pub fn flaky(issuer: Option<KeyPair>) -> (Self, Arc<FlakyStore>) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let flaky = Arc::new(FlakyStore::new(
            LocalStore::open(dir.path()).expect("Failed to open store"),
        ));
        let village = Self::assemble(VillageConfig::default(), flaky.clone(), issuer, dir);
        (village, flaky)
    }

    fn assemble(
        config: VillageConfig,
        store: Arc<dyn VillageStore>,
        issuer: Option<KeyPair>,
        dir: TempDir,
    ) -> Self {
        let chain = Arc::new(StubChain::default());
        let ctx = AppContext::new(config, store.clone(), chain.clone(), issuer);
        Self {
            ctx: Arc::new(ctx),
            chain,
            store,
            _dir: dir,
        }
    }

    pub async fn campaign(&self, category: Category, onchain_id: u64) -> Campaign {
        create_campaign(
            self.store.as_ref(),
            NewCampaign {
                organization_name: "Paws Shelter".to_string(),
                title: format!("Campaign {}", onchain_id),
                description: "Winter food for shelter animals".to_string(),
                category,
                goal_amount: 5_000_000,
                opening_amount: 100_000,
                image_url: String::new(),
                house_color: "#8D6E63".to_string(),
                organization_address: None,
                deadline: None,
                onchain_id: Some(onchain_id),
            },
        )
        .await
        .expect("Failed to create campaign")
    }
}

pub fn contract() -> Address {
    DEFAULT_CONTRACT_ADDRESS.parse().expect("valid contract address")
}

pub fn donor(seed: u8) -> Address {
    Address([seed; 20])
}

pub fn tx_hash(seed: u8) -> TxHash {
    let mut bytes = [0u8; 32];
    bytes[0] = 0xab;
    bytes[31] = seed;
    TxHash(bytes)
}

/// A `DonationMade` log emitted by `emitter`
pub fn donation_log(
    emitter: Address,
    donation_id: u128,
    campaign_id: u128,
    donor: Address,
    amount: u128,
) -> Log {
    let mut donor_word = [0u8; 32];
    donor_word[12..].copy_from_slice(&donor.0);
    let mut data = u128_to_word(amount).to_vec();
    data.extend_from_slice(&u128_to_word(1_717_171_717));
    Log {
        address: emitter,
        topics: vec![
            donation_made_topic(),
            u128_to_word(donation_id),
            u128_to_word(campaign_id),
            donor_word,
        ],
        data,
    }
}

pub fn receipt(hash: TxHash, status: TransactionStatus, logs: Vec<Log>) -> TransactionReceipt {
    TransactionReceipt {
        tx_hash: hash,
        block_number: 1_234,
        status,
        from: None,
        to: Some(contract()),
        logs,
    }
}

/// Mined donation of `amount` wei by `donor` to on-chain campaign `campaign_id`
pub fn donation_receipt(hash: TxHash, donor: Address, campaign_id: u128, amount: u128) -> TransactionReceipt {
    let donation_id = u128::from(hash.0[31]);
    receipt(
        hash,
        TransactionStatus::Success,
        vec![donation_log(contract(), donation_id, campaign_id, donor, amount)],
    )
}
