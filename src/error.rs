//! Error types for the cache store
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache store.
///
/// Malformed TTLs never produce an error; everything else that goes wrong
/// while talking to the backend is surfaced here unchanged.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backend refused or failed an operation
    #[error("Backend error: {0}")]
    Backend(String),

    /// Reading or writing the persistent store file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope or value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache store.
pub type Result<T> = std::result::Result<T, CacheError>;
