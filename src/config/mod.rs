//! Drop-behind cache configuration
//!
//! Large sequential reads pull whole blocks through the page cache and
//! evict pages other readers still need. These settings decide when a
//! reader asks the OS to drop what it has already read.
//!
//! ```json
//! {
//!   "drop_cache_behind_large_reads": true,
//!   "large_read_threshold_bytes": 262144,
//!   "drop_cache_interval_bytes": 1048576
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reads at least this long count as large (256 KiB)
pub const DEFAULT_LARGE_READ_THRESHOLD_BYTES: u64 = 256 * 1024;

/// Bytes read between two drop-behind advisories (1 MiB)
pub const DEFAULT_DROP_CACHE_INTERVAL_BYTES: u64 = 1024 * 1024;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Drop-behind settings for replica reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDropConfig {
    /// Drop behind every read
    #[serde(default)]
    pub drop_cache_behind_all: bool,

    /// Drop behind reads of at least `large_read_threshold_bytes`
    #[serde(default)]
    pub drop_cache_behind_large_reads: bool,

    #[serde(default = "default_large_read_threshold")]
    pub large_read_threshold_bytes: u64,

    #[serde(default = "default_drop_cache_interval")]
    pub drop_cache_interval_bytes: u64,
}

fn default_large_read_threshold() -> u64 {
    DEFAULT_LARGE_READ_THRESHOLD_BYTES
}

fn default_drop_cache_interval() -> u64 {
    DEFAULT_DROP_CACHE_INTERVAL_BYTES
}

impl Default for CacheDropConfig {
    fn default() -> Self {
        Self {
            drop_cache_behind_all: false,
            drop_cache_behind_large_reads: false,
            large_read_threshold_bytes: default_large_read_threshold(),
            drop_cache_interval_bytes: default_drop_cache_interval(),
        }
    }
}

impl CacheDropConfig {
    /// Parses and validates a JSON document. Missing keys take defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.drop_cache_interval_bytes == 0 {
            return Err(ConfigError::Invalid(
                "drop_cache_interval_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a read of `read_length` bytes should drop behind itself.
    pub fn drops_behind(&self, read_length: u64) -> bool {
        self.drop_cache_behind_all
            || (self.drop_cache_behind_large_reads
                && read_length >= self.large_read_threshold_bytes)
    }
}
