//! Environment variable overrides
//!
//! Variable names match the hosted deployment so the same `.env` works for
//! both.

use tracing::{info, warn};

use super::VillageConfig;

pub const ENV_BACKEND: &str = "VILLAGE_BACKEND";
pub const ENV_DATA_DIR: &str = "VILLAGE_DATA_DIR";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
pub const ENV_RPC_URL: &str = "ARBITRUM_SEPOLIA_RPC";
pub const ENV_EXPLORER_BASE: &str = "BLOCK_EXPLORER_BASE";
pub const ENV_ISSUER_KEY: &str = "VILLAGE_ISSUER_KEY";

/// Apply overrides read through `lookup` (usually `std::env::var`)
pub fn apply_env_overrides<F>(config: &mut VillageConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_BACKEND) {
        match raw.parse() {
            Ok(mode) => {
                info!("{} = {}", ENV_BACKEND, mode);
                config.backend.mode = mode;
            }
            Err(e) => warn!("Ignoring {}: {}", ENV_BACKEND, e),
        }
    }
    if let Some(dir) = lookup(ENV_DATA_DIR) {
        config.backend.data_dir = dir.into();
    }
    if let Some(url) = non_empty(lookup(ENV_SUPABASE_URL)) {
        config.backend.supabase_url = Some(url);
    }
    if let Some(key) = non_empty(lookup(ENV_SUPABASE_SERVICE_ROLE_KEY)) {
        config.backend.service_role_key = Some(key);
    }
    // Empty CONTRACT_ADDRESS clears the default deployment
    if let Some(contract) = lookup(ENV_CONTRACT_ADDRESS) {
        config.chain.contract_address = Some(contract);
    }
    if let Some(rpc) = non_empty(lookup(ENV_RPC_URL)) {
        config.chain.rpc_url = rpc;
    }
    if let Some(base) = lookup(ENV_EXPLORER_BASE) {
        config.chain.explorer_base = base;
    }
    if let Some(key) = non_empty(lookup(ENV_ISSUER_KEY)) {
        config.credentials.issuer_key = Some(key);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_storage::BackendMode;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = VillageConfig::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                (ENV_BACKEND, "supabase"),
                (ENV_SUPABASE_URL, "https://x.supabase.co"),
                (ENV_SUPABASE_SERVICE_ROLE_KEY, "service-key"),
                (ENV_RPC_URL, "http://localhost:8545"),
            ]),
        );
        assert_eq!(config.backend.mode, BackendMode::Supabase);
        assert_eq!(config.backend.service_role_key.as_deref(), Some("service-key"));
        assert_eq!(config.chain.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn test_empty_contract_clears_default() {
        let mut config = VillageConfig::default();
        apply_env_overrides(&mut config, lookup_from(&[(ENV_CONTRACT_ADDRESS, "")]));
        assert!(config.contract().is_none());
    }

    #[test]
    fn test_bad_backend_is_ignored() {
        let mut config = VillageConfig::default();
        apply_env_overrides(&mut config, lookup_from(&[(ENV_BACKEND, "postgres")]));
        assert_eq!(config.backend.mode, BackendMode::Local);
    }
}
