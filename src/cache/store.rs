//! Cache Store Module
//!
//! Facade combining key prefixing, TTL envelopes and remember-style
//! memoization on top of a [`Backend`].

use std::borrow::Cow;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::backend::Backend;
use crate::cache::entry::current_timestamp;
use crate::cache::{CacheEntry, Ttl};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Write-through cache facade.
///
/// Holds nothing but the backend handle and an optional key prefix; every
/// call is a fresh round trip to the backend. Stores sharing a backend and a
/// prefix see each other's entries.
#[derive(Debug, Clone)]
pub struct CacheStore<B> {
    /// Where entries actually live
    backend: B,
    /// Namespace prepended to every key
    key_prefix: Option<String>,
}

impl<B: Backend> CacheStore<B> {
    // == Constructors ==
    /// Creates a store without key namespacing.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            key_prefix: None,
        }
    }

    /// Creates a store whose keys are all prefixed with `prefix`.
    ///
    /// An empty prefix is the same as no prefix.
    pub fn with_prefix(backend: B, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            backend,
            key_prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    /// Creates a store using the prefix from `config`.
    pub fn from_config(backend: B, config: &Config) -> Self {
        match &config.key_prefix {
            Some(prefix) => Self::with_prefix(backend, prefix.clone()),
            None => Self::new(backend),
        }
    }

    /// The key prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn storage_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match &self.key_prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}{key}")),
            None => Cow::Borrowed(key),
        }
    }

    /// An empty stored string counts as no entry at all.
    fn read_entry(&self, storage_key: &str) -> Result<Option<CacheEntry>> {
        match self.backend.get(storage_key)? {
            Some(raw) if !raw.is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    fn write_entry(&self, storage_key: &str, entry: &CacheEntry) -> Result<()> {
        self.backend.set(storage_key, serde_json::to_string(entry)?)
    }

    // == Put ==
    /// Stores `value` under `key`, overwriting any previous entry, and hands
    /// the value back.
    ///
    /// Every TTL shape is accepted; see [`Ttl`].
    pub fn put<T: Serialize>(&self, key: &str, value: T, ttl: impl Into<Ttl>) -> Result<T> {
        let storage_key = self.storage_key(key);
        let entry = CacheEntry::new(Some(serde_json::to_value(&value)?), ttl.into());

        self.write_entry(&storage_key, &entry)?;
        debug!(key = %storage_key, expires_at = ?entry.expires_at, "cache put");
        Ok(value)
    }

    // == Delete ==
    /// Removes `key`. Returns true if an entry, live or expired, existed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let storage_key = self.storage_key(key);
        let existed = self.backend.remove(&storage_key)?;
        debug!(key = %storage_key, existed, "cache delete");
        Ok(existed)
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// Returns None when the key is absent, when its entry expired, or when
    /// only a placeholder is stored. Expired entries are left in place.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let storage_key = self.storage_key(key);
        let Some(entry) = self.read_entry(&storage_key)? else {
            debug!(key = %storage_key, "cache miss");
            return Ok(None);
        };

        if entry.is_expired_at(current_timestamp()) {
            debug!(key = %storage_key, "cache entry expired");
            return Ok(None);
        }

        match entry.value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// [`get`](Self::get) falling back to `default`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Returns the raw envelope under `key`, whether expired or not.
    pub fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        self.read_entry(&self.storage_key(key))
    }

    // == Remember ==
    /// Returns the fresh value under `key`, or computes, stores and returns
    /// it with `callback`.
    ///
    /// On a miss a value-less placeholder is written with the same TTL before
    /// `callback` runs. The placeholder does not exclude concurrent callers:
    /// two callers missing at once both compute and the later write wins.
    /// Errors from `callback` are returned as-is and leave the placeholder
    /// behind.
    pub fn remember<T, E, F>(
        &self,
        key: &str,
        ttl: impl Into<Ttl>,
        callback: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<CacheError>,
    {
        let ttl = ttl.into();
        if let Some(value) = self.fresh_value(key)? {
            return Ok(value);
        }

        self.reserve(key, ttl)?;
        let value = callback()?;
        Ok(self.put(key, value, ttl)?)
    }

    /// [`remember`](Self::remember) with an entry that never expires.
    pub fn remember_forever<T, E, F>(&self, key: &str, callback: F) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<CacheError>,
    {
        self.remember(key, Ttl::Never, callback)
    }

    // == Remember Async ==
    /// Async counterpart of [`remember`](Self::remember).
    ///
    /// The only suspension point is awaiting the future returned by
    /// `callback`. Dropping the returned future while it is suspended leaves
    /// the placeholder in the backend.
    pub async fn remember_async<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: impl Into<Ttl>,
        callback: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<CacheError>,
    {
        let ttl = ttl.into();
        if let Some(value) = self.fresh_value(key)? {
            return Ok(value);
        }

        self.reserve(key, ttl)?;
        let value = callback().await?;
        Ok(self.put(key, value, ttl)?)
    }

    /// [`remember_async`](Self::remember_async) with an entry that never expires.
    pub async fn remember_forever_async<T, E, F, Fut>(
        &self,
        key: &str,
        callback: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<CacheError>,
    {
        self.remember_async(key, Ttl::Never, callback).await
    }

    /// Value `remember` may serve without recomputing: present, not a
    /// placeholder, and expiring strictly after now.
    fn fresh_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let storage_key = self.storage_key(key);
        let entry = self
            .read_entry(&storage_key)?
            .filter(|entry| entry.is_fresh_at(current_timestamp()));

        match entry.and_then(|entry| entry.value) {
            Some(value) => {
                debug!(key = %storage_key, "cache hit");
                Ok(Some(serde_json::from_value(value)?))
            }
            None => {
                debug!(key = %storage_key, "cache miss, computing");
                Ok(None)
            }
        }
    }

    fn reserve(&self, key: &str, ttl: Ttl) -> Result<()> {
        self.write_entry(&self.storage_key(key), &CacheEntry::new(None, ttl))
    }
}
