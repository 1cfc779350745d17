//! Backend Module
//!
//! The string-keyed, string-valued persistent store the cache facade writes
//! through to, plus the implementations shipped with the crate.

mod file;
mod memory;

use std::sync::Arc;

use crate::error::Result;

pub use file::FileBackend;
pub use memory::MemoryBackend;

// == Backend Trait ==
/// A persistent key-value store with `get`/`set`/`remove` semantics.
///
/// Each call is expected to be atomic on its own. Nothing above this trait
/// makes multi-call sequences atomic.
pub trait Backend: Send + Sync {
    /// Returns the raw string stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing whatever was there.
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Returns true if it existed.
    fn remove(&self, key: &str) -> Result<bool>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key)
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key)
    }
}
