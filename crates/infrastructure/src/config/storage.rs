use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RECORD_TTL_SECS, DEFAULT_STORAGE_PATH};

/// Record store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the redb database file.
    #[serde(default = "default_path")]
    pub path: String,

    /// Lifetime of every written record, in seconds.
    #[serde(default = "default_record_ttl_secs")]
    pub record_ttl_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            record_ttl_secs: default_record_ttl_secs(),
        }
    }
}

fn default_path() -> String {
    DEFAULT_STORAGE_PATH.to_string()
}

fn default_record_ttl_secs() -> u64 {
    DEFAULT_RECORD_TTL_SECS
}
