//! Storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all runtime data.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Maximum upload size in bytes (default 1 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Default storage quota for newly provisioned accounts (100 MiB).
    #[serde(default = "default_account_quota")]
    pub default_account_quota_bytes: i64,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            max_upload_size_bytes: default_max_upload(),
            default_account_quota_bytes: default_account_quota(),
            local: LocalStorageConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for local file storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_max_upload() -> u64 {
    1_073_741_824 // 1 GB
}

fn default_account_quota() -> i64 {
    104_857_600 // 100 MiB
}

fn default_local_root() -> String {
    "./data/files".to_string()
}
