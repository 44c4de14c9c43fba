// packages/lib-identity/src/did/mod.rs
// did:ethr identifiers for village accounts

pub mod document_generation;

pub use document_generation::*;

use lib_crypto::Address;
use thiserror::Error;

use crate::constants::{
    ARBITRUM_SEPOLIA_CHAIN_ID, DID_ETHR_PREFIX, NETWORK_ARBITRUM, NETWORK_ARBITRUM_SEPOLIA,
};

/// DID parsing failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DidError {
    #[error("not a recognized DID: {0}")]
    Unrecognized(String),
}

/// Network label used inside the DID for a chain id
pub fn network_label(chain_id: u64) -> &'static str {
    if chain_id == ARBITRUM_SEPOLIA_CHAIN_ID {
        NETWORK_ARBITRUM_SEPOLIA
    } else {
        NETWORK_ARBITRUM
    }
}

/// Build the DID for an address
///
/// DID format: "did:ethr:{network}:{lowercase address}"
pub fn create_did(address: &Address, chain_id: u64) -> String {
    format!(
        "{}{}:{}",
        DID_ETHR_PREFIX,
        network_label(chain_id),
        address.to_lowercase_hex()
    )
}

/// Extract the address from a DID
///
/// Only `did:ethr:arbitrum:` and `did:ethr:arbitrum-sepolia:` followed by
/// `0x` and exactly 40 hex digits are accepted.
pub fn parse_did(did: &str) -> Result<Address, DidError> {
    let unrecognized = || DidError::Unrecognized(did.to_string());

    let rest = did.strip_prefix(DID_ETHR_PREFIX).ok_or_else(unrecognized)?;
    let (network, address) = rest.split_once(':').ok_or_else(unrecognized)?;
    if network != NETWORK_ARBITRUM && network != NETWORK_ARBITRUM_SEPOLIA {
        return Err(unrecognized());
    }

    let hex_part = address.strip_prefix("0x").ok_or_else(unrecognized)?;
    if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(unrecognized());
    }
    address.parse::<Address>().map_err(|_| unrecognized())
}
