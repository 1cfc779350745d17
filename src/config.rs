//! Configuration Module
//!
//! Handles loading the cache store configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default location of the file-backed store.
pub const DEFAULT_STORE_PATH: &str = "cache_store.json";

/// Cache store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix applied to every key, None = no namespacing
    pub key_prefix: Option<String>,
    /// Path of the file used by the persistent backend
    pub store_path: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_KEY_PREFIX` - Key prefix (default: none, empty counts as none)
    /// - `CACHE_STORE_PATH` - Store file path (default: `cache_store.json`)
    pub fn from_env() -> Self {
        Self {
            key_prefix: env::var("CACHE_KEY_PREFIX")
                .ok()
                .filter(|prefix| !prefix.is_empty()),
            store_path: env::var("CACHE_STORE_PATH")
                .ok()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_prefix: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}
