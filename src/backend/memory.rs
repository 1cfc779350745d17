//! In-Memory Backend
//!
//! Ordered map shared between clones, standing in for a per-origin store.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::trace;

use crate::backend::Backend;
use crate::error::{CacheError, Result};

// == Memory Backend ==
/// Volatile backend. Clones share the same underlying map, so two cache
/// stores built from clones of one `MemoryBackend` see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    items: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    // == Length ==
    /// Returns the number of raw items held, expired ones included.
    pub fn len(&self) -> Result<usize> {
        Ok(self.items.read().map_err(poisoned)?.len())
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // == Keys ==
    /// Returns the raw (prefixed) keys in order.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.read().map_err(poisoned)?.keys().cloned().collect())
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Backend("memory backend lock poisoned".to_string())
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        trace!(key, bytes = value.len(), "memory backend set");
        let mut items = self.items.write().map_err(poisoned)?;
        items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        trace!(key, "memory backend remove");
        let mut items = self.items.write().map_err(poisoned)?;
        Ok(items.remove(key).is_some())
    }
}
