//! Donation Village Storage
//!
//! Persistence for users, campaigns, donations and credentials behind the
//! `VillageStore` trait, with two implementations:
//!
//! - `LocalStore`: embedded sled database for development and offline use
//! - `SupabaseStore`: the hosted database through its PostgREST API
//!
//! The backend is chosen once from configuration (`open_store`). Shared
//! counters (points, campaign amounts) are only changed through versioned
//! compare-and-swap with bounded retry (`operations::retry_cas`).

pub mod backend;
pub mod errors;
pub mod operations;
pub mod types;

pub use backend::{open_store, LocalStore, SupabaseStore, VillageStore};
pub use errors::{Result, StorageError};
pub use operations::{
    campaign_audit, create_campaign, delete_campaign, increase_campaign_amount, retry_cas,
    update_campaign, CasRetryable, MAX_CAS_ATTEMPTS,
};
pub use types::{
    BackendMode, Campaign, CampaignAudit, CampaignUpdate, CredentialRow, Donation, NewCampaign,
    StorageConfig, UserRecord,
};
