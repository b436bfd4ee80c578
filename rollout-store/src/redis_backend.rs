//! Redis-backed durable store and cache.

use crate::config::{Backend, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::traits::{CacheStore, FlagStore};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Shared connection handling for the Redis store and cache.
#[derive(Clone)]
struct RedisConnection {
    manager: ConnectionManager,
    operation_timeout: Duration,
}

impl RedisConnection {
    async fn open(config: &StoreConfig) -> StoreResult<Self> {
        if config.backend != Backend::Redis {
            return Err(StoreError::InvalidUrl(format!(
                "Expected a Redis configuration, got {}",
                config.backend
            )));
        }

        let client =
            Client::open(config.url.as_str()).map_err(|e| StoreError::Connection(e.to_string()))?;

        let connect = ConnectionManager::new(client);
        let manager = tokio::time::timeout(config.connection_timeout, connect)
            .await?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(url = %config.url, "Connected to Redis");

        Ok(Self {
            manager,
            operation_timeout: config.operation_timeout,
        })
    }

    /// Run one command against a cloned connection, bounded by the operation timeout.
    async fn run<T, F, Fut>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let limit = self.operation_timeout;
        let pending = op(self.manager.clone());
        let result = tokio::time::timeout(limit, pending).await?;
        Ok(result?)
    }
}

/// Durable feature store on Redis sets and strings.
#[derive(Clone)]
pub struct RedisStore {
    connection: RedisConnection,
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rollout_store::*;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), StoreError> {
    ///     let config = StoreConfig::redis("redis://localhost:6379")?;
    ///     let store = RedisStore::new(config).await?;
    ///     store.set_add("feature:chat:groups", "all").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            connection: RedisConnection::open(&config).await?,
        })
    }
}

#[async_trait]
impl FlagStore for RedisStore {
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        self.connection
            .run(|mut conn| async move { conn.sadd(key, member).await })
            .await
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        self.connection
            .run(|mut conn| async move { conn.srem(key, member).await })
            .await
    }

    async fn set_members(&self, key: &str) -> StoreResult<Option<BTreeSet<String>>> {
        // SMEMBERS cannot tell an empty set from a missing key; Redis never
        // keeps empty sets, so both mean absent.
        let members: BTreeSet<String> = self
            .connection
            .run(|mut conn| async move { conn.smembers(key).await })
            .await?;
        Ok((!members.is_empty()).then_some(members))
    }

    async fn is_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.connection
            .run(|mut conn| async move { conn.sismember(key, member).await })
            .await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.connection
            .run(|mut conn| async move { conn.get(key).await })
            .await
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.connection
            .run(|mut conn| async move { conn.set(key, value).await })
            .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.connection
            .run(|mut conn| async move { conn.del(key).await })
            .await
    }
}

/// Cache layer on Redis string keys.
#[derive(Clone)]
pub struct RedisCache {
    connection: RedisConnection,
}

impl RedisCache {
    /// Connect to Redis.
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            connection: RedisConnection::open(&config).await?,
        })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_json(&self, key: &str) -> StoreResult<Option<String>> {
        self.connection
            .run(|mut conn| async move { conn.get(key).await })
            .await
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        self.connection
            .run(|mut conn| async move {
                match ttl {
                    Some(ttl) => conn.set_ex(key, value, ttl.as_secs().max(1)).await,
                    None => conn.set(key, value).await,
                }
            })
            .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.connection
            .run(|mut conn| async move { conn.del(key).await })
            .await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.connection
            .run(|mut conn| async move { conn.exists(key).await })
            .await
    }

    async fn clear(&self) -> StoreResult<()> {
        let flush = redis::cmd("FLUSHDB");
        self.connection
            .run(|mut conn| async move { flush.query_async(&mut conn).await })
            .await
    }
}
