//! Store and cache trait definitions.

use crate::error::StoreResult;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::Duration;

/// Durable key-value and set store that holds feature state.
///
/// Implementations follow Redis semantics: a set whose last member is
/// removed ceases to exist, and reading it reports `None`.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Add a member to the set at `key`, creating the set if needed.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Remove a member from the set at `key`.
    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Get all members of the set at `key`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the set does not exist.
    async fn set_members(&self, key: &str) -> StoreResult<Option<BTreeSet<String>>>;

    /// Check whether `member` belongs to the set at `key`.
    async fn is_member(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Get the string value at `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set the string value at `key`, replacing whatever was there.
    async fn set(&self, key: &str, value: String) -> StoreResult<()>;

    /// Delete `key`, whatever its type. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Delete multiple keys concurrently.
    async fn delete_many(&self, keys: &[&str]) -> StoreResult<()> {
        use futures::future::try_join_all;

        let futures = keys.iter().map(|key| self.delete(key));
        try_join_all(futures).await?;
        Ok(())
    }
}

/// Cache layer in front of a [`FlagStore`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a JSON document from the cache.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(value))` on a hit and `Ok(None)` on a miss. Transport
    /// failures are errors and must never be reported as a miss.
    async fn get_json(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set a JSON document in the cache.
    ///
    /// # Arguments
    ///
    /// * `key` - The cache key
    /// * `value` - The JSON string value
    /// * `ttl` - Optional time-to-live; `None` keeps the entry until deleted
    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Check if a key exists in the cache.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Clear all keys from the cache.
    ///
    /// **Warning:** This operation may be destructive and affect all keys.
    async fn clear(&self) -> StoreResult<()>;

    /// Delete multiple keys concurrently.
    async fn delete_many(&self, keys: &[&str]) -> StoreResult<()> {
        use futures::future::try_join_all;

        let futures = keys.iter().map(|key| self.delete(key));
        try_join_all(futures).await?;
        Ok(())
    }
}
