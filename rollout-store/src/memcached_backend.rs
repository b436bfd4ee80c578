//! Memcached cache layer.

use crate::config::{Backend, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::traits::CacheStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Memcached cache store.
///
/// The `memcache` client is blocking, so every call runs on the blocking
/// pool. Unlike a best-effort cache, read failures are reported as errors
/// rather than folded into a miss.
#[derive(Clone)]
pub struct MemcachedCache {
    client: Arc<Mutex<memcache::Client>>,
    operation_timeout: Duration,
}

impl MemcachedCache {
    /// Connect to Memcached.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rollout_store::*;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), StoreError> {
    ///     let config = StoreConfig::memcached("localhost:11211")?;
    ///     let cache = MemcachedCache::new(config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        if config.backend != Backend::Memcached {
            return Err(StoreError::InvalidUrl(format!(
                "Expected a Memcached configuration, got {}",
                config.backend
            )));
        }

        let url = config.url.clone();
        let connect = tokio::task::spawn_blocking(move || memcache::connect(url.as_str()));
        let client = tokio::time::timeout(config.connection_timeout, connect)
            .await?
            .map_err(|e| StoreError::Connection(format!("Failed to spawn task: {}", e)))?
            .map_err(|e| StoreError::Connection(format!("Failed to connect: {}", e)))?;

        tracing::info!(url = %config.url, "Connected to Memcached");

        Ok(Self {
            client: Arc::new(Mutex::new(client)),
            operation_timeout: config.operation_timeout,
        })
    }

    /// Convert Duration to Memcached expiration (in seconds, 0 = never).
    fn duration_to_expiration(ttl: Option<Duration>) -> u32 {
        ttl.map(|d| d.as_secs().clamp(1, u32::MAX as u64) as u32)
            .unwrap_or(0)
    }

    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&memcache::Client) -> Result<T, memcache::MemcacheError> + Send + 'static,
    {
        let client = self.client.clone();
        let task = tokio::task::spawn_blocking(move || {
            let client = client.blocking_lock();
            op(&client)
        });

        let result = tokio::time::timeout(self.operation_timeout, task)
            .await?
            .map_err(|e| StoreError::Other(format!("Task join error: {}", e)))?;
        Ok(result?)
    }
}

#[async_trait]
impl CacheStore for MemcachedCache {
    async fn get_json(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_string();
        self.blocking(move |client| client.get::<String>(&key))
            .await
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        let key = key.to_string();
        let expiration = Self::duration_to_expiration(ttl);
        self.blocking(move |client| client.set(&key, value.as_str(), expiration))
            .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let key = key.to_string();
        self.blocking(move |client| client.delete(&key)).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        // Memcached has no EXISTS command
        Ok(self.get_json(key).await?.is_some())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.blocking(|client| client.flush()).await
    }
}
