//! Cache Store - A key-value cache facade
//!
//! Adds key prefixes, TTL expiry and remember-style memoization on top of any
//! string-keyed persistent store.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;

pub use backend::{Backend, FileBackend, MemoryBackend};
pub use cache::{CacheEntry, CacheStore, Ttl};
pub use config::Config;
pub use error::{CacheError, Result};
