//! Application context
//!
//! Everything a handler or service needs, built once at startup and shared
//! behind an `Arc`. There are no process-wide singletons.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use lib_blockchain::{ChainClient, JsonRpcClient};
use lib_crypto::{Address, KeyPair};
use lib_identity::AuthService;
use lib_storage::{open_store, VillageStore};
use tracing::{info, warn};

use crate::config::VillageConfig;

/// Shared service state
pub struct AppContext {
    pub config: VillageConfig,
    pub store: Arc<dyn VillageStore>,
    pub chain: Arc<dyn ChainClient>,
    /// Signs issued credentials when configured
    pub issuer: Option<KeyPair>,
    pub auth: AuthService,
    contract: Option<Address>,
}

impl AppContext {
    /// Assemble a context from already-built collaborators
    pub fn new(
        config: VillageConfig,
        store: Arc<dyn VillageStore>,
        chain: Arc<dyn ChainClient>,
        issuer: Option<KeyPair>,
    ) -> Self {
        let contract = config.contract();
        let auth = AuthService::new(config.chain.chain_id);
        Self {
            config,
            store,
            chain,
            issuer,
            auth,
            contract,
        }
    }

    /// Open the configured backend and RPC client
    pub async fn from_config(config: VillageConfig) -> Result<Self> {
        let store = open_store(&config.storage_config()).context("Failed to open storage backend")?;
        let chain = JsonRpcClient::new(
            config.chain.rpc_url.clone(),
            Duration::from_secs(config.chain.rpc_timeout_secs),
        )
        .context("Failed to build RPC client")?;

        match chain.chain_id().await {
            Ok(id) if id != config.chain.chain_id => warn!(
                configured = config.chain.chain_id,
                reported = id,
                "RPC endpoint reports a different chain id"
            ),
            Ok(id) => info!(chain_id = id, rpc = %config.chain.rpc_url, "RPC endpoint reachable"),
            Err(e) => warn!(error = %e, "RPC endpoint not reachable at startup"),
        }

        let issuer = config.issuer_keypair()?;
        match &issuer {
            Some(keypair) => info!(issuer = %keypair.address(), "Credential issuer key loaded"),
            None => warn!("No issuer key configured; credentials will be stored unsigned"),
        }

        Ok(Self::new(config, store, Arc::new(chain), issuer))
    }

    /// Deployed donation contract
    pub fn contract(&self) -> Option<Address> {
        self.contract
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain.chain_id
    }

    /// Address whose DID issues credentials: the signing key, else the contract
    pub fn issuer_address(&self) -> Option<Address> {
        self.issuer
            .as_ref()
            .map(KeyPair::address)
            .or(self.contract)
    }
}
