//! Transaction Receipt Types
//!
//! `RpcReceipt` mirrors the JSON-RPC wire shape (hex quantities, camelCase);
//! `TransactionReceipt` is the decoded form the rest of the workspace uses.

use lib_crypto::Address;
use serde::{Deserialize, Serialize};

use crate::errors::{ChainError, ChainResult};
use crate::types::{decode_hex, decode_word, parse_quantity, TxHash};

/// Execution outcome of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// status = 1
    Success,
    /// status = 0
    Reverted,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Success => write!(f, "Success"),
            TransactionStatus::Reverted => write!(f, "Reverted"),
        }
    }
}

/// Log entry on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub log_index: Option<String>,
}

/// Receipt on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub logs: Vec<RpcLog>,
}

/// Decoded log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
}

impl TryFrom<RpcLog> for Log {
    type Error = ChainError;

    fn try_from(raw: RpcLog) -> ChainResult<Self> {
        let address = raw
            .address
            .parse()
            .map_err(|e| ChainError::MalformedLog(format!("bad log address: {}", e)))?;
        let topics = raw
            .topics
            .iter()
            .map(|t| decode_word(t))
            .collect::<ChainResult<Vec<_>>>()?;
        let data = if raw.data.is_empty() { Vec::new() } else { decode_hex(&raw.data)? };
        Ok(Log { address, topics, data })
    }
}

/// Receipt for a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub status: TransactionStatus,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    /// Logs emitted by a given contract
    pub fn logs_from<'a>(&'a self, contract: &'a Address) -> impl Iterator<Item = &'a Log> + 'a {
        self.logs.iter().filter(move |log| &log.address == contract)
    }
}

fn parse_optional_address(raw: Option<String>) -> ChainResult<Option<Address>> {
    raw.filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|e| ChainError::InvalidResponse(format!("bad address {}: {}", s, e)))
        })
        .transpose()
}

impl TryFrom<RpcReceipt> for TransactionReceipt {
    type Error = ChainError;

    fn try_from(raw: RpcReceipt) -> ChainResult<Self> {
        let tx_hash = raw.transaction_hash.parse()?;
        let block_number = match raw.block_number.as_deref() {
            Some(n) => parse_quantity(n)?,
            None => 0,
        };
        // Pre-Byzantium receipts carry no status; Arbitrum always does
        let status = match raw.status.as_deref().map(parse_quantity).transpose()? {
            Some(1) => TransactionStatus::Success,
            Some(0) => TransactionStatus::Reverted,
            Some(other) => {
                return Err(ChainError::InvalidResponse(format!(
                    "unexpected receipt status {}",
                    other
                )))
            }
            None => {
                return Err(ChainError::InvalidResponse("receipt has no status".to_string()))
            }
        };
        let logs = raw
            .logs
            .into_iter()
            .map(Log::try_from)
            .collect::<ChainResult<Vec<_>>>()?;

        Ok(TransactionReceipt {
            tx_hash,
            block_number,
            status,
            from: parse_optional_address(raw.from)?,
            to: parse_optional_address(raw.to)?,
            logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_receipt(status: &str) -> RpcReceipt {
        serde_json::from_value(serde_json::json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "status": status,
            "from": "0x0000000000000000000000000000000000000001",
            "to": "0x0000000000000000000000000000000000000002",
            "logs": [{
                "address": "0x0000000000000000000000000000000000000002",
                "topics": [format!("0x{}", "22".repeat(32))],
                "data": "0x",
                "logIndex": "0x0"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_receipt_decoding() {
        let receipt = TransactionReceipt::try_from(raw_receipt("0x1")).unwrap();
        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.status, TransactionStatus::Success);
        assert!(receipt.is_success());
        assert_eq!(receipt.logs.len(), 1);
        assert!(receipt.logs[0].data.is_empty());
        assert_eq!(receipt.logs[0].topics[0], [0x22; 32]);
    }

    #[test]
    fn test_reverted_receipt() {
        let receipt = TransactionReceipt::try_from(raw_receipt("0x0")).unwrap();
        assert_eq!(receipt.status, TransactionStatus::Reverted);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(TransactionReceipt::try_from(raw_receipt("0x2")).is_err());
    }

    #[test]
    fn test_logs_from_filters_by_contract() {
        let receipt = TransactionReceipt::try_from(raw_receipt("0x1")).unwrap();
        let contract: Address = "0x0000000000000000000000000000000000000002".parse().unwrap();
        assert_eq!(receipt.logs_from(&contract).count(), 1);
        assert_eq!(receipt.logs_from(&Address::ZERO).count(), 0);
    }
}
