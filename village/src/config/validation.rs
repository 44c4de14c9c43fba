//! Configuration validation

use lib_crypto::{KeyPair, PrivateKey};
use lib_storage::BackendMode;

use super::{ConfigError, VillageConfig};

/// Check the assembled configuration before anything is opened
pub fn validate_configuration(config: &VillageConfig) -> Result<(), ConfigError> {
    if config.backend.mode == BackendMode::Supabase {
        let url = config
            .backend
            .supabase_url
            .as_deref()
            .ok_or(ConfigError::MissingSetting {
                setting: "supabase_url",
                mode: BackendMode::Supabase,
            })?;
        require_http("backend.supabase_url", url)?;
        if config.backend.service_role_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingSetting {
                setting: "service_role_key",
                mode: BackendMode::Supabase,
            });
        }
    }

    if config.chain.chain_id == 0 {
        return Err(ConfigError::InvalidValue {
            field: "chain.chain_id",
            reason: "must be non-zero".to_string(),
        });
    }
    require_http("chain.rpc_url", &config.chain.rpc_url)?;

    // Unset or empty is "not deployed"; anything else must be an address
    if let Some(raw) = config.chain.contract_address.as_deref() {
        if !raw.trim().is_empty() && config.contract().is_none() {
            return Err(ConfigError::InvalidValue {
                field: "chain.contract_address",
                reason: format!("not an address: {}", raw),
            });
        }
    }

    for (field, secs) in [
        ("server.request_timeout_secs", config.server.request_timeout_secs),
        ("backend.request_timeout_secs", config.backend.request_timeout_secs),
        ("chain.rpc_timeout_secs", config.chain.rpc_timeout_secs),
    ] {
        if secs == 0 {
            return Err(ConfigError::InvalidValue {
                field,
                reason: "timeout must be at least one second".to_string(),
            });
        }
    }

    if let Some(key) = config.credentials.issuer_key.as_deref() {
        parse_issuer_key(key)?;
    }
    Ok(())
}

fn require_http(field: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("expected an http(s) URL, got {}", url),
        })
    }
}

/// Parse a hex private key (with or without `0x`)
pub fn parse_issuer_key(raw: &str) -> Result<KeyPair, ConfigError> {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(body).map_err(|e| ConfigError::InvalidIssuerKey(e.to_string()))?;
    let secret: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ConfigError::InvalidIssuerKey("expected 32 bytes".to_string()))?;
    KeyPair::from_private_key(&PrivateKey::from_bytes(secret))
        .map_err(|e| ConfigError::InvalidIssuerKey(e.to_string()))
}
