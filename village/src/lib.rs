//! Donation Village Service
//!
//! Wires the library crates into a running service:
//!
//! - `config`: layered TOML / environment / CLI configuration
//! - `context`: the shared `AppContext` (store, chain client, issuer key)
//! - `donation`: transaction verification and points reconciliation
//! - `shop`: furniture purchases
//! - `accounts`: user records and summaries
//! - `api`: the axum HTTP surface

pub mod accounts;
pub mod api;
pub mod config;
pub mod context;
pub mod donation;
pub mod shop;

pub use config::{load_configuration, CliArgs, ConfigError, VillageConfig};
pub use context::AppContext;
pub use donation::{verify_donation, DonationCredit, DonationError, VerificationResult};
pub use shop::{buy_furniture, PurchaseReceipt, ShopError};
