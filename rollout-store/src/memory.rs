//! In-process store and cache.

use crate::error::{StoreError, StoreResult};
use crate::traits::{CacheStore, FlagStore};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Slot {
    Set(BTreeSet<String>),
    Text(String),
}

/// In-memory durable store with Redis-like typing rules.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<HashMap<String, Slot>>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the store holds no keys
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl FlagStore for InMemoryStore {
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Slot::Set(BTreeSet::new()))
        {
            Slot::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            Slot::Text(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let emptied = match data.get_mut(key) {
            None => return Ok(()),
            Some(Slot::Text(_)) => return Err(StoreError::WrongType(key.to_string())),
            Some(Slot::Set(members)) => {
                members.remove(member);
                members.is_empty()
            }
        };
        if emptied {
            data.remove(key);
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> StoreResult<Option<BTreeSet<String>>> {
        match self.data.read().await.get(key) {
            None => Ok(None),
            Some(Slot::Set(members)) => Ok(Some(members.clone())),
            Some(Slot::Text(_)) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn is_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        match self.data.read().await.get(key) {
            None => Ok(false),
            Some(Slot::Set(members)) => Ok(members.contains(member)),
            Some(Slot::Text(_)) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.data.read().await.get(key) {
            None => Ok(None),
            Some(Slot::Text(value)) => Ok(Some(value.clone())),
            Some(Slot::Set(_)) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.data
            .write()
            .await
            .insert(key.to_string(), Slot::Text(value));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }
}

/// In-memory cache layer
pub struct InMemoryCache {
    data: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<tokio::time::Instant>,
}

impl CacheEntry {
    fn is_live(&self) -> bool {
        self.expires_at
            .is_none_or(|exp| exp > tokio::time::Instant::now())
    }
}

impl InMemoryCache {
    /// Create new in-memory cache
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drop expired entries
    pub async fn cleanup_expired(&self) {
        self.data.write().await.retain(|_, entry| entry.is_live());
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get_json(&self, key: &str) -> StoreResult<Option<String>> {
        let data = self.data.read().await;
        Ok(data
            .get(key)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone()))
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at = ttl.map(|d| tokio::time::Instant::now() + d);
        let entry = CacheEntry { value, expires_at };
        self.data.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.get_json(key).await.map(|v| v.is_some())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.data.write().await.clear();
        Ok(())
    }
}
