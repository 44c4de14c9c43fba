//! Ethereum JSON-RPC client
//!
//! Only the two calls the donation service needs: `eth_getTransactionReceipt`
//! and `eth_chainId`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{ChainError, ChainResult};
use crate::receipts::{RpcReceipt, TransactionReceipt};
use crate::types::{parse_quantity, TxHash};

/// Default public Arbitrum Sepolia endpoint
pub const DEFAULT_RPC_URL: &str = "https://sepolia-rollup.arbitrum.io/rpc";

/// Read access to the chain
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Receipt for a transaction, `None` while it is still pending
    async fn get_transaction_receipt(&self, tx_hash: &TxHash)
        -> ChainResult<Option<TransactionReceipt>>;

    /// Chain id reported by the node
    async fn chain_id(&self) -> ChainResult<u64>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// HTTP JSON-RPC 2.0 client
pub struct JsonRpcClient {
    rpc_url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Client against `rpc_url` with a per-request timeout
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> ChainResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            rpc_url: rpc_url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Issue one call and return the raw `result` (JSON `null` included)
    async fn call(&self, method: &str, params: Value) -> ChainResult<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "JSON-RPC request");

        let resp = self.client.post(&self.rpc_url).json(&request).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(method, %status, "JSON-RPC HTTP failure");
            return Err(ChainError::Transport(format!("HTTP {} - {}", status, body)));
        }

        let response: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        if let Some(error) = response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn get_transaction_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> ChainResult<Option<TransactionReceipt>> {
        let result = self
            .call("eth_getTransactionReceipt", serde_json::json!([tx_hash.to_hex()]))
            .await?;
        parse_receipt_result(result)
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        let result = self.call("eth_chainId", serde_json::json!([])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse(format!("eth_chainId returned {}", result)))?;
        parse_quantity(raw)
    }
}

/// Decode the `result` of `eth_getTransactionReceipt`
pub fn parse_receipt_result(result: Value) -> ChainResult<Option<TransactionReceipt>> {
    if result.is_null() {
        return Ok(None);
    }
    let raw: RpcReceipt = serde_json::from_value(result)
        .map_err(|e| ChainError::InvalidResponse(format!("bad receipt: {}", e)))?;
    TransactionReceipt::try_from(raw).map(Some)
}
