//! Read-through and write-through reconciliation between store and cache.
//!
//! Writers change the durable store first and then either refresh the cache
//! entry from the store or evict it. Readers consult the cache first: a hit
//! or a tombstone is final, a miss falls back to the store and repopulates
//! the cache. Without a cache every call goes straight to the store.
//!
//! Concurrent writers to one key are last-writer-wins in the cache and may
//! briefly leave it behind the store until the next write to that key.

use crate::entry::{self, CacheEntry, StoredValue, ValueKind};
use crate::error::RolloutResult;
use rollout_store::{CacheStore, FlagStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// Keeps an optional cache coherent with the durable store.
#[derive(Clone)]
pub struct CacheSync {
    store: Arc<dyn FlagStore>,
    cache: Option<Arc<dyn CacheStore>>,
    ttl: Option<Duration>,
}

impl CacheSync {
    pub fn new(
        store: Arc<dyn FlagStore>,
        cache: Option<Arc<dyn CacheStore>>,
        ttl: Option<Duration>,
    ) -> Self {
        Self { store, cache, ttl }
    }

    pub fn store(&self) -> &Arc<dyn FlagStore> {
        &self.store
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Read `key` straight from the durable store.
    pub async fn fetch(&self, key: &str, kind: ValueKind) -> RolloutResult<Option<StoredValue>> {
        Ok(match kind {
            ValueKind::Set => self.store.set_members(key).await?.map(StoredValue::Members),
            ValueKind::Text => self.store.get(key).await?.map(StoredValue::Text),
        })
    }

    /// Look `key` up in the cache without touching the store.
    ///
    /// Always a miss when no cache is configured. Unreadable entries, or
    /// entries of the wrong kind, are reported as a miss so the next read
    /// overwrites them.
    pub async fn lookup(&self, key: &str, kind: ValueKind) -> RolloutResult<CacheEntry> {
        let Some(cache) = &self.cache else {
            return Ok(CacheEntry::Miss);
        };
        let Some(raw) = cache.get_json(key).await? else {
            return Ok(CacheEntry::Miss);
        };
        Ok(entry::decode(&raw, kind).unwrap_or_else(|| {
            warn!(key, "Discarding unreadable cache entry");
            CacheEntry::Miss
        }))
    }

    /// Resolve `key` through the cache, falling back to the store on a miss.
    ///
    /// `None` means the store has no value, whether that came from a
    /// tombstone or from the store itself.
    pub async fn read(&self, key: &str, kind: ValueKind) -> RolloutResult<Option<StoredValue>> {
        if !self.has_cache() {
            return self.fetch(key, kind).await;
        }
        match self.lookup(key, kind).await? {
            CacheEntry::Hit(value) => {
                trace!(key, "Cache hit");
                Ok(Some(value))
            }
            CacheEntry::Tombstone => {
                trace!(key, "Cache tombstone");
                Ok(None)
            }
            CacheEntry::Miss => {
                trace!(key, "Cache miss");
                let value = self.fetch(key, kind).await?;
                self.populate(key, value.as_ref()).await?;
                Ok(value)
            }
        }
    }

    /// Re-read `key` from the store and overwrite its cache entry.
    ///
    /// Does nothing without a cache.
    pub async fn refresh(&self, key: &str, kind: ValueKind) -> RolloutResult<()> {
        if !self.has_cache() {
            return Ok(());
        }
        let value = self.fetch(key, kind).await?;
        self.populate(key, value.as_ref()).await
    }

    /// Evict `keys` from the cache.
    pub async fn expire(&self, keys: &[&str]) -> RolloutResult<()> {
        if let Some(cache) = &self.cache {
            cache.delete_many(keys).await?;
        }
        Ok(())
    }

    async fn populate(&self, key: &str, value: Option<&StoredValue>) -> RolloutResult<()> {
        if let Some(cache) = &self.cache {
            let raw = entry::encode(value)?;
            cache.set_json(key, raw, self.ttl).await?;
        }
        Ok(())
    }
}
