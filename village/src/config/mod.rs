//! Service Configuration Management
//!
//! Configuration is assembled in layers, later layers winning:
//!
//! 1. built-in defaults (`VillageConfig::default`)
//! 2. an optional TOML file with any subset of `[server]`, `[backend]`,
//!    `[chain]` and `[credentials]`
//! 3. environment variables (see `environment`)
//! 4. command-line flags
//!
//! and validated once before anything is opened.

pub mod environment;
pub mod validation;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use lib_blockchain::{is_contract_deployed, DEFAULT_CONTRACT_ADDRESS, DEFAULT_EXPLORER_BASE, DEFAULT_RPC_URL};
use lib_crypto::{Address, KeyPair};
use lib_identity::constants::ARBITRUM_SEPOLIA_CHAIN_ID;
use lib_storage::{BackendMode, StorageConfig};
use serde::{Deserialize, Serialize};

pub use environment::apply_env_overrides;
pub use validation::validate_configuration;

// ============================================================================
// Resolved configuration
// ============================================================================

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; empty means any
    pub cors_origins: Vec<String>,
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub mode: BackendMode,
    pub data_dir: PathBuf,
    pub supabase_url: Option<String>,
    pub service_role_key: Option<String>,
    pub request_timeout_secs: u64,
}

/// Chain access settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    /// Donation contract; `None` or empty means not deployed
    pub contract_address: Option<String>,
    pub explorer_base: String,
    pub rpc_timeout_secs: u64,
}

/// Credential issuance settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CredentialConfig {
    /// Hex secp256k1 key that signs issued credentials
    pub issuer_key: Option<String>,
}

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VillageConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub chain: ChainConfig,
    pub credentials: CredentialConfig,
}

impl Default for VillageConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
                request_timeout_secs: 30,
                cors_origins: Vec::new(),
            },
            backend: BackendConfig {
                mode: BackendMode::Local,
                data_dir: default_data_dir(),
                supabase_url: None,
                service_role_key: None,
                request_timeout_secs: 10,
            },
            chain: ChainConfig {
                chain_id: ARBITRUM_SEPOLIA_CHAIN_ID,
                rpc_url: DEFAULT_RPC_URL.to_string(),
                contract_address: Some(DEFAULT_CONTRACT_ADDRESS.to_string()),
                explorer_base: DEFAULT_EXPLORER_BASE.to_string(),
                rpc_timeout_secs: 15,
            },
            credentials: CredentialConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|d| d.join(".village").join("data"))
        .unwrap_or_else(|| PathBuf::from("./data/village"))
}

impl VillageConfig {
    /// Storage settings in the form `lib-storage` expects
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            mode: self.backend.mode,
            data_dir: self.backend.data_dir.clone(),
            supabase_url: self.backend.supabase_url.clone(),
            service_role_key: self.backend.service_role_key.clone(),
            request_timeout: Duration::from_secs(self.backend.request_timeout_secs),
        }
    }

    /// Parsed contract address, if one is deployed
    pub fn contract(&self) -> Option<Address> {
        is_contract_deployed(self.chain.contract_address.as_deref())
    }

    /// Issuer key pair, if configured
    pub fn issuer_keypair(&self) -> Result<Option<KeyPair>, ConfigError> {
        self.credentials
            .issuer_key
            .as_deref()
            .map(validation::parse_issuer_key)
            .transpose()
    }

    /// Merge a partial file over these values
    pub fn merge_partial(&mut self, partial: PartialConfig) {
        if let Some(server) = partial.server {
            if let Some(bind_addr) = server.bind_addr {
                self.server.bind_addr = bind_addr;
            }
            if let Some(secs) = server.request_timeout_secs {
                self.server.request_timeout_secs = secs;
            }
            if let Some(origins) = server.cors_origins {
                self.server.cors_origins = origins;
            }
        }

        if let Some(backend) = partial.backend {
            if let Some(mode) = backend.mode {
                tracing::info!("Loaded backend mode = {} from [backend] section", mode);
                self.backend.mode = mode;
            }
            if let Some(data_dir) = backend.data_dir {
                self.backend.data_dir = data_dir;
            }
            if backend.supabase_url.is_some() {
                self.backend.supabase_url = backend.supabase_url;
            }
            if backend.service_role_key.is_some() {
                self.backend.service_role_key = backend.service_role_key;
            }
            if let Some(secs) = backend.request_timeout_secs {
                self.backend.request_timeout_secs = secs;
            }
        }

        if let Some(chain) = partial.chain {
            if let Some(chain_id) = chain.chain_id {
                self.chain.chain_id = chain_id;
            }
            if let Some(rpc_url) = chain.rpc_url {
                self.chain.rpc_url = rpc_url;
            }
            if let Some(contract) = chain.contract_address {
                self.chain.contract_address = Some(contract);
            }
            if let Some(explorer) = chain.explorer_base {
                self.chain.explorer_base = explorer;
            }
            if let Some(secs) = chain.rpc_timeout_secs {
                self.chain.rpc_timeout_secs = secs;
            }
        }

        if let Some(credentials) = partial.credentials {
            if credentials.issuer_key.is_some() {
                self.credentials.issuer_key = credentials.issuer_key;
            }
        }
    }

    /// Apply command-line overrides
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(data_dir) = &args.data_dir {
            self.backend.data_dir = data_dir.clone();
        }
        if let Some(mode) = args.backend {
            self.backend.mode = mode;
        }
        if let Some(port) = args.port {
            self.server.bind_addr.set_port(port);
        }
    }
}

// ============================================================================
// Partial file sections
// ============================================================================

/// Configuration file with optional sections
///
/// ```toml
/// [backend]
/// mode = "supabase"
/// supabase_url = "https://xyz.supabase.co"
///
/// [chain]
/// contract_address = "0x9e4C6825cbb7a13a0Eb56310239b7A06356E8cA1"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(default)]
    pub server: Option<PartialServerConfig>,
    #[serde(default)]
    pub backend: Option<PartialBackendConfig>,
    #[serde(default)]
    pub chain: Option<PartialChainConfig>,
    #[serde(default)]
    pub credentials: Option<PartialCredentialConfig>,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PartialServerConfig {
    #[serde(default)]
    pub bind_addr: Option<SocketAddr>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub cors_origins: Option<Vec<String>>,
}

/// `[backend]`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PartialBackendConfig {
    #[serde(default)]
    pub mode: Option<BackendMode>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub service_role_key: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// `[chain]`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PartialChainConfig {
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub explorer_base: Option<String>,
    #[serde(default)]
    pub rpc_timeout_secs: Option<u64>,
}

/// `[credentials]`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PartialCredentialConfig {
    #[serde(default)]
    pub issuer_key: Option<String>,
}

// ============================================================================
// Loading
// ============================================================================

/// Command line arguments that affect configuration
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub backend: Option<BackendMode>,
    pub port: Option<u16>,
}

/// Parse a configuration file body
pub fn parse_config_file(content: &str) -> Result<PartialConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

async fn read_config_file(path: &Path) -> Result<PartialConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config_file(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Load and validate the complete configuration
pub async fn load_configuration(args: &CliArgs) -> Result<VillageConfig> {
    let mut config = VillageConfig::default();

    if let Some(path) = &args.config {
        if path.exists() {
            tracing::info!("Loading configuration from {}", path.display());
            config.merge_partial(read_config_file(path).await?);
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.apply_cli_overrides(args);

    validate_configuration(&config)?;

    tracing::info!(
        backend = %config.backend.mode,
        chain_id = config.chain.chain_id,
        contract = config.chain.contract_address.as_deref().unwrap_or("<none>"),
        "Configuration validated"
    );
    Ok(config)
}

/// Configuration validation error
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {setting} for {mode} backend")]
    MissingSetting { setting: &'static str, mode: BackendMode },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid issuer key: {0}")]
    InvalidIssuerKey(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] toml::de::Error),
}
