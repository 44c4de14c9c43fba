//! Village persistence trait
//!
//! ## Example
//! ```rust,ignore
//! use lib_storage::backend::VillageStore;
//!
//! async fn credit<S: VillageStore + ?Sized>(store: &S, address: &Address) -> anyhow::Result<()> {
//!     let mut user = store.get_user(address).await?.ok_or_else(|| anyhow::anyhow!("no user"))?;
//!     let expected = user.version;
//!     user.points += 10;
//!     store.compare_and_swap_user(expected, &user).await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use lib_crypto::Address;
use lib_identity::VerifiableCredential;

use crate::errors::Result;
use crate::types::{Campaign, Donation, UserRecord};

/// Async persistence for users, campaigns, donations and credentials
///
/// Conditional writes are version based: `compare_and_swap_*` succeeds only
/// when the stored version equals `expected_version`, stores the record with
/// version `expected_version + 1`, and returns what was stored. A lost race
/// yields `StorageError::CasConflict`.
#[async_trait]
pub trait VillageStore: Send + Sync {
    /// Short name for logs
    fn backend_name(&self) -> &'static str;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Fetch a user by wallet address
    async fn get_user(&self, address: &Address) -> Result<Option<UserRecord>>;

    /// Insert the user unless one already exists; returns the stored record
    async fn create_user_if_absent(&self, user: &UserRecord) -> Result<UserRecord>;

    /// Conditional user update
    async fn compare_and_swap_user(
        &self,
        expected_version: u64,
        updated: &UserRecord,
    ) -> Result<UserRecord>;

    // ------------------------------------------------------------------
    // Campaigns
    // ------------------------------------------------------------------

    /// All campaigns, newest first
    async fn list_campaigns(&self) -> Result<Vec<Campaign>>;

    async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>>;

    /// Insert a new campaign (its id must be unused)
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<Campaign>;

    /// Conditional campaign update
    async fn compare_and_swap_campaign(
        &self,
        expected_version: u64,
        updated: &Campaign,
    ) -> Result<Campaign>;

    /// Delete a campaign; returns whether it existed
    async fn delete_campaign(&self, id: &str) -> Result<bool>;

    // ------------------------------------------------------------------
    // Donations
    // ------------------------------------------------------------------

    /// Insert unless a donation with the same tx hash exists
    ///
    /// Returns `true` only for the caller whose row was written.
    async fn insert_donation_if_absent(&self, donation: &Donation) -> Result<bool>;

    async fn get_donation_by_tx(&self, tx_hash: &str) -> Result<Option<Donation>>;

    /// Flip the donation's `credited` flag to `true`
    ///
    /// Returns `true` only for the caller that flipped it. A missing row is
    /// `StorageError::NotFound`.
    async fn mark_donation_credited(&self, tx_hash: &str) -> Result<bool>;

    async fn list_donations_for_campaign(&self, campaign_id: &str) -> Result<Vec<Donation>>;

    async fn list_donations_for_donor(&self, donor: &Address) -> Result<Vec<Donation>>;

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    /// Append to the DID's credential list
    async fn append_credential(&self, did: &str, credential: &VerifiableCredential) -> Result<()>;

    /// Credentials for a DID in append order
    async fn list_credentials(&self, did: &str) -> Result<Vec<VerifiableCredential>>;
}
