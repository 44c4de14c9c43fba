//! Donation verification and points reconciliation
//!
//! Turns an on-chain `DonationMade` event into off-chain bookkeeping: a
//! donation row, a point credit, badge awards, a campaign amount increase,
//! and credentials for the donor's DID.

pub mod credentials;
pub mod verification;

use lib_blockchain::ChainError;
use lib_crypto::Address;
use lib_storage::{CasRetryable, StorageError};
use serde::Serialize;
use thiserror::Error;

pub use credentials::issue_donation_credentials;
pub use verification::verify_donation;

/// Outcome of a verification request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// No receipt yet; the caller should retry later
    Pending,
    /// The transaction reverted
    Failed,
    /// Mined, but no `DonationMade` log from the configured contract
    NoDonationEvent,
    /// The event names a different donor
    Mismatch { claimed: Address, actual: Address },
    /// This transaction was credited before; nothing changed
    AlreadyVerified,
    Success(DonationCredit),
}

/// What a successful verification credited
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationCredit {
    pub tx_hash: String,
    /// Points earned by this donation
    pub points: u64,
    /// Balance after the credit
    pub total_points: u64,
    pub donation_count: u64,
    /// Badges unlocked by this donation
    pub new_badges: Vec<BadgeAward>,
    /// Local campaign credited, if the on-chain campaign is known here
    pub campaign_id: Option<String>,
    pub krw_amount: u64,
    pub explorer_url: String,
}

/// Newly awarded badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeAward {
    pub id: String,
    pub name: String,
}

/// Verification failure
#[derive(Error, Debug)]
pub enum DonationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Donation contract is not deployed")]
    ContractNotDeployed,

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Too many concurrent updates, try again")]
    Contention,
}

impl CasRetryable for DonationError {
    fn is_cas_conflict(&self) -> bool {
        matches!(self, DonationError::Storage(StorageError::CasConflict))
    }
}

impl DonationError {
    /// Exhausted CAS retries become `Contention`
    pub(crate) fn from_retry(e: DonationError) -> DonationError {
        if e.is_cas_conflict() {
            DonationError::Contention
        } else {
            e
        }
    }
}
