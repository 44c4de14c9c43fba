//! Donation contract event decoding
//!
//! `DonationMade` carries three indexed fields and two data words:
//!
//! ```text
//! topics[0] = keccak256("DonationMade(uint256,uint256,address,uint256,uint256)")
//! topics[1] = donationId
//! topics[2] = campaignId
//! topics[3] = donor (left-padded address)
//! data      = amount || timestamp
//! ```

use lib_crypto::{keccak_id, Address};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ChainError, ChainResult};
use crate::receipts::{Log, TransactionReceipt};
use crate::types::{word_to_u128, word_to_u64};

// ============================================================================
// EVENT SIGNATURES
// ============================================================================

/// Canonical `DonationMade` signature
pub const DONATION_MADE_SIGNATURE: &str =
    "DonationMade(uint256,uint256,address,uint256,uint256)";

/// Canonical `CampaignCreated` signature
pub const CAMPAIGN_CREATED_SIGNATURE: &str = "CampaignCreated(uint256,string,string,address)";

/// topics[0] of a `DonationMade` log
pub fn donation_made_topic() -> [u8; 32] {
    keccak_id(DONATION_MADE_SIGNATURE)
}

/// topics[0] of a `CampaignCreated` log
pub fn campaign_created_topic() -> [u8; 32] {
    keccak_id(CAMPAIGN_CREATED_SIGNATURE)
}

// ============================================================================
// EVENT TYPES
// ============================================================================

/// Decoded `DonationMade` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationMadeEvent {
    pub donation_id: u128,
    pub campaign_id: u128,
    pub donor: Address,
    /// Wei
    pub amount: u128,
    /// Block timestamp in unix seconds
    pub timestamp: u64,
}

impl DonationMadeEvent {
    pub fn is_from(&self, donor: &Address) -> bool {
        &self.donor == donor
    }
}

/// Decode a log as `DonationMade`
///
/// Returns `Ok(None)` when the log is some other event and an error when it
/// carries the right topic but the wrong shape.
pub fn decode_donation_made(log: &Log) -> ChainResult<Option<DonationMadeEvent>> {
    if log.topics.first() != Some(&donation_made_topic()) {
        return Ok(None);
    }
    if log.topics.len() != 4 {
        return Err(ChainError::MalformedLog(format!(
            "DonationMade expects 4 topics, got {}",
            log.topics.len()
        )));
    }
    if log.data.len() < 64 {
        return Err(ChainError::MalformedLog(format!(
            "DonationMade expects 64 data bytes, got {}",
            log.data.len()
        )));
    }

    let mut amount_word = [0u8; 32];
    amount_word.copy_from_slice(&log.data[..32]);
    let mut timestamp_word = [0u8; 32];
    timestamp_word.copy_from_slice(&log.data[32..64]);

    Ok(Some(DonationMadeEvent {
        donation_id: word_to_u128(&log.topics[1])?,
        campaign_id: word_to_u128(&log.topics[2])?,
        donor: Address::from_word(&log.topics[3]),
        amount: word_to_u128(&amount_word)?,
        timestamp: word_to_u64(&timestamp_word)?,
    }))
}

/// First `DonationMade` event in a receipt
///
/// When `contract` is given only logs emitted by that address are considered.
/// Malformed candidate logs are skipped.
pub fn find_donation_event(
    receipt: &TransactionReceipt,
    contract: Option<&Address>,
) -> Option<DonationMadeEvent> {
    receipt
        .logs
        .iter()
        .filter(|log| contract.map_or(true, |c| &log.address == c))
        .find_map(|log| match decode_donation_made(log) {
            Ok(event) => event,
            Err(e) => {
                debug!(tx = %receipt.tx_hash, error = %e, "skipping malformed DonationMade log");
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipts::TransactionStatus;
    use crate::types::{u128_to_word, TxHash};

    fn donor() -> Address {
        Address([0xab; 20])
    }

    fn contract() -> Address {
        Address([0x9e; 20])
    }

    fn donation_log(emitter: Address, donor: Address, amount: u128) -> Log {
        let mut donor_word = [0u8; 32];
        donor_word[12..].copy_from_slice(donor.as_bytes());
        let mut data = u128_to_word(amount).to_vec();
        data.extend_from_slice(&u128_to_word(1_700_000_000));
        Log {
            address: emitter,
            topics: vec![donation_made_topic(), u128_to_word(7), u128_to_word(2), donor_word],
            data,
        }
    }

    fn receipt_with(logs: Vec<Log>) -> TransactionReceipt {
        TransactionReceipt {
            tx_hash: TxHash([1u8; 32]),
            block_number: 1,
            status: TransactionStatus::Success,
            from: Some(donor()),
            to: Some(contract()),
            logs,
        }
    }

    #[test]
    fn test_decode_donation_made() {
        let event = decode_donation_made(&donation_log(contract(), donor(), 10u128.pow(16)))
            .unwrap()
            .unwrap();
        assert_eq!(event.donation_id, 7);
        assert_eq!(event.campaign_id, 2);
        assert_eq!(event.donor, donor());
        assert_eq!(event.amount, 10u128.pow(16));
        assert_eq!(event.timestamp, 1_700_000_000);
        assert!(event.is_from(&donor()));
    }

    #[test]
    fn test_other_events_are_ignored() {
        let mut log = donation_log(contract(), donor(), 1);
        log.topics[0] = campaign_created_topic();
        assert_eq!(decode_donation_made(&log).unwrap(), None);
    }

    #[test]
    fn test_short_data_is_malformed() {
        let mut log = donation_log(contract(), donor(), 1);
        log.data.truncate(32);
        assert!(matches!(decode_donation_made(&log), Err(ChainError::MalformedLog(_))));
    }

    #[test]
    fn test_find_filters_by_contract() {
        let receipt = receipt_with(vec![donation_log(Address([0x11; 20]), donor(), 5)]);
        assert!(find_donation_event(&receipt, None).is_some());
        assert!(find_donation_event(&receipt, Some(&contract())).is_none());
    }

    #[test]
    fn test_find_skips_malformed_logs() {
        let mut broken = donation_log(contract(), donor(), 1);
        broken.topics.truncate(2);
        let good = donation_log(contract(), donor(), 42);
        let receipt = receipt_with(vec![broken, good]);
        let event = find_donation_event(&receipt, Some(&contract())).unwrap();
        assert_eq!(event.amount, 42);
    }

    #[test]
    fn test_topics_are_distinct() {
        assert_ne!(donation_made_topic(), campaign_created_topic());
    }
}
