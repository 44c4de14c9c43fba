//! Donation Village Chain Access
//!
//! Read-side view of the donation contract on Arbitrum: transaction receipts,
//! `DonationMade` event decoding, a JSON-RPC client behind the `ChainClient`
//! trait, and block-explorer helpers.

pub mod contracts;
pub mod errors;
pub mod events;
pub mod receipts;
pub mod rpc;
pub mod types;

pub use contracts::{
    encode_donate_call, function_selector, is_contract_deployed, normalize_explorer_base,
    tx_explorer_url, DEFAULT_CONTRACT_ADDRESS, DEFAULT_EXPLORER_BASE, DONATION_CONTRACT_ABI,
};
pub use errors::{ChainError, ChainResult};
pub use events::{decode_donation_made, donation_made_topic, find_donation_event, DonationMadeEvent};
pub use receipts::{Log, TransactionReceipt, TransactionStatus};
pub use rpc::{ChainClient, JsonRpcClient, DEFAULT_RPC_URL};
pub use types::TxHash;

/// Arbitrum Sepolia chain id
pub const ARBITRUM_SEPOLIA_CHAIN_ID: u64 = 421_614;
