//! Storage type definitions
//!
//! Records double as the database row format: field names are the
//! snake_case column names of the hosted tables.

pub mod config_types;
pub mod records;

pub use config_types::{BackendMode, StorageConfig};
pub use records::{
    Campaign, CampaignAudit, CampaignUpdate, CredentialRow, Donation, NewCampaign, UserRecord,
};
