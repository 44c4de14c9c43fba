//! Donation contract surface
//!
//! Human-readable ABI, call encoding for the few functions the service needs,
//! the default deployment, and block-explorer link helpers.

use lib_crypto::{keccak_id, Address};

use crate::types::u128_to_word;

/// Default `DonationVillage` deployment on Arbitrum Sepolia
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x9e4C6825cbb7a13a0Eb56310239b7A06356E8cA1";

/// Default transaction explorer base
pub const DEFAULT_EXPLORER_BASE: &str = "https://sepolia-explorer.arbitrum.io/tx/";

/// Human-readable ABI of the donation contract
pub const DONATION_CONTRACT_ABI: &[&str] = &[
    "function getCampaign(uint256 _campaignId) view returns (uint256 id, string organizationName, string title, string description, address beneficiary, uint256 goalAmount, uint256 currentAmount, uint256 donorCount, bool isActive, uint256 createdAt)",
    "function campaignCount() view returns (uint256)",
    "function donate(uint256 _campaignId, string _message) payable",
    "function getDonation(uint256 _donationId) view returns (uint256 id, uint256 campaignId, address donor, uint256 amount, string message, uint256 timestamp)",
    "function getUserDonations(address _user) view returns (uint256[])",
    "function getCampaignDonations(uint256 _campaignId) view returns (uint256[])",
    "function donationCount() view returns (uint256)",
    "function totalDonatedByUser(address) view returns (uint256)",
    "event DonationMade(uint256 indexed donationId, uint256 indexed campaignId, address indexed donor, uint256 amount, uint256 timestamp)",
    "event CampaignCreated(uint256 indexed campaignId, string organizationName, string title, address beneficiary)",
];

/// First four bytes of the keccak hash of a function signature
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak_id(signature);
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `donate(uint256,string)`
pub fn encode_donate_call(campaign_id: u128, message: &str) -> Vec<u8> {
    let bytes = message.as_bytes();
    let padded_len = bytes.len().div_ceil(32) * 32;

    let mut out = Vec::with_capacity(4 + 32 * 3 + padded_len);
    out.extend_from_slice(&function_selector("donate(uint256,string)"));
    out.extend_from_slice(&u128_to_word(campaign_id));
    // Head is two words, so the string tail starts at 0x40
    out.extend_from_slice(&u128_to_word(64));
    out.extend_from_slice(&u128_to_word(bytes.len() as u128));
    out.extend_from_slice(bytes);
    out.resize(4 + 32 * 3 + padded_len, 0);
    out
}

/// Calldata for `getCampaign(uint256)`
pub fn encode_get_campaign_call(campaign_id: u128) -> Vec<u8> {
    let mut out = function_selector("getCampaign(uint256)").to_vec();
    out.extend_from_slice(&u128_to_word(campaign_id));
    out
}

/// Calldata for `getDonation(uint256)`
pub fn encode_get_donation_call(donation_id: u128) -> Vec<u8> {
    let mut out = function_selector("getDonation(uint256)").to_vec();
    out.extend_from_slice(&u128_to_word(donation_id));
    out
}

/// Parse a configured contract address; `None` means not deployed
pub fn is_contract_deployed(configured: Option<&str>) -> Option<Address> {
    configured
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Normalize a configured explorer base into a `.../tx/` prefix
///
/// Documentation links fall back to the default explorer.
pub fn normalize_explorer_base(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains("docs.arbitrum.io") {
        return DEFAULT_EXPLORER_BASE.to_string();
    }
    if raw.contains("/tx/") {
        return with_trailing_slash(raw);
    }
    if raw.ends_with("/tx") {
        return format!("{}/", raw);
    }
    format!("{}tx/", with_trailing_slash(raw))
}

fn with_trailing_slash(raw: &str) -> String {
    if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    }
}

/// Explorer link for a transaction
pub fn tx_explorer_url(base: &str, tx_hash: &str) -> String {
    format!("{}{}", normalize_explorer_base(base), tx_hash)
}
