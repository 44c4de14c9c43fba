//! Configuration type definitions
//!
//! Which backend to open and how to reach it. The application decides once at
//! startup; there is no fallback between backends at runtime.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Persistence backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Embedded sled database under `data_dir`
    Local,
    /// Hosted Supabase project via PostgREST
    Supabase,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Local => write!(f, "local"),
            BackendMode::Supabase => write!(f, "supabase"),
        }
    }
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "sled" => Ok(BackendMode::Local),
            "supabase" | "remote" => Ok(BackendMode::Supabase),
            other => Err(format!("Unknown backend mode: {}", other)),
        }
    }
}

/// Storage system configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub mode: BackendMode,
    /// Local database directory
    pub data_dir: PathBuf,
    /// Supabase project URL
    pub supabase_url: Option<String>,
    /// Supabase service-role key
    pub service_role_key: Option<String>,
    /// Per-request timeout for the hosted database
    pub request_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Local,
            data_dir: PathBuf::from("./data/village"),
            supabase_url: None,
            service_role_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}
