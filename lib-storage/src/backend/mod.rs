//! Storage backend implementations
//!
//! `VillageStore` is the persistence seam. `LocalStore` keeps everything in an
//! embedded sled database; `SupabaseStore` talks to the hosted PostgREST API.

pub mod sled_backend;
pub mod supabase_backend;
pub mod traits;

pub use sled_backend::LocalStore;
pub use supabase_backend::SupabaseStore;
pub use traits::VillageStore;

use std::sync::Arc;

use tracing::info;

use crate::errors::{Result, StorageError};
use crate::types::{BackendMode, StorageConfig};

/// Open the backend named by the configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn VillageStore>> {
    let store: Arc<dyn VillageStore> = match config.mode {
        BackendMode::Local => Arc::new(LocalStore::open(&config.data_dir)?),
        BackendMode::Supabase => {
            let url = config
                .supabase_url
                .as_deref()
                .ok_or_else(|| StorageError::Config("supabase_url is required".to_string()))?;
            let key = config
                .service_role_key
                .as_deref()
                .ok_or_else(|| StorageError::Config("service_role_key is required".to_string()))?;
            Arc::new(SupabaseStore::new(url, key, config.request_timeout)?)
        }
    };
    info!(backend = store.backend_name(), "Storage backend ready");
    Ok(store)
}
