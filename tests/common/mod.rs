//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rollout::{CacheStore, FlagStore, InMemoryCache, InMemoryStore, StoreError, StoreResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Install a test-friendly tracing subscriber once; `RUST_LOG` controls output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Simple user stand-in.
pub struct TestUser {
    pub id: u64,
}

impl rollout::User for TestUser {
    fn id(&self) -> u64 {
        self.id
    }
}

pub fn user(id: u64) -> TestUser {
    TestUser { id }
}

/// Durable store that counts reads per operation.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    pub set_members_calls: AtomicUsize,
    pub is_member_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.set_members_calls.load(Ordering::SeqCst)
            + self.is_member_calls.load(Ordering::SeqCst)
            + self.get_calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }
}

#[async_trait]
impl FlagStore for CountingStore {
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        self.inner.set_add(key, member).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        self.inner.set_remove(key, member).await
    }

    async fn set_members(&self, key: &str) -> StoreResult<Option<BTreeSet<String>>> {
        self.set_members_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set_members(key).await
    }

    async fn is_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.is_member_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.is_member(key, member).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key).await
    }
}

/// Cache that counts every call.
#[derive(Default)]
pub struct CountingCache {
    inner: InMemoryCache,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
            + self.sets.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &InMemoryCache {
        &self.inner
    }
}

#[async_trait]
impl CacheStore for CountingCache {
    async fn get_json(&self, key: &str) -> StoreResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_json(key).await
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set_json(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.inner.exists(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.inner.clear().await
    }
}

/// Store whose every call fails like a dropped connection.
pub struct UnreachableStore;

#[async_trait]
impl FlagStore for UnreachableStore {
    async fn set_add(&self, _key: &str, _member: &str) -> StoreResult<()> {
        Err(StoreError::Connection("connection refused".to_string()))
    }

    async fn set_remove(&self, _key: &str, _member: &str) -> StoreResult<()> {
        Err(StoreError::Connection("connection refused".to_string()))
    }

    async fn set_members(&self, _key: &str) -> StoreResult<Option<BTreeSet<String>>> {
        Err(StoreError::Timeout)
    }

    async fn is_member(&self, _key: &str, _member: &str) -> StoreResult<bool> {
        Err(StoreError::Timeout)
    }

    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Timeout)
    }

    async fn set(&self, _key: &str, _value: String) -> StoreResult<()> {
        Err(StoreError::Connection("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::Connection("connection refused".to_string()))
    }
}

/// Cache whose reads time out.
pub struct UnreachableCache;

#[async_trait]
impl CacheStore for UnreachableCache {
    async fn get_json(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Timeout)
    }

    async fn set_json(
        &self,
        _key: &str,
        _value: String,
        _ttl: Option<Duration>,
    ) -> StoreResult<()> {
        Err(StoreError::Timeout)
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::Timeout)
    }

    async fn exists(&self, _key: &str) -> StoreResult<bool> {
        Err(StoreError::Timeout)
    }

    async fn clear(&self) -> StoreResult<()> {
        Err(StoreError::Timeout)
    }
}

pub fn counting() -> (Arc<CountingStore>, Arc<CountingCache>) {
    (
        Arc::new(CountingStore::new()),
        Arc::new(CountingCache::new()),
    )
}
