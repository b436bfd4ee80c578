//! Storage collaborators for the rollout feature-flag evaluator.
//!
//! Two seams are defined here: [`FlagStore`], the durable key-value and set
//! store that owns feature state, and [`CacheStore`], an optional read-through
//! layer in front of it. In-memory implementations of both are always
//! available; networked backends sit behind cargo features.
//!
//! # Features
//!
//! - `redis` - [`RedisStore`] and [`RedisCache`]
//! - `memcached` - [`MemcachedCache`]
//!
//! # Examples
//!
//! ```
//! use rollout_store::*;
//!
//! # async fn example() -> StoreResult<()> {
//! let store = InMemoryStore::new();
//! store.set_add("feature:chat:groups", "all").await?;
//! assert!(store.is_member("feature:chat:groups", "all").await?);
//!
//! let cache = InMemoryCache::new();
//! assert_eq!(cache.get_json("feature:chat:groups").await?, None);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "redis")]
pub mod redis_backend;

#[cfg(feature = "memcached")]
pub mod memcached_backend;

pub use config::{Backend, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryCache, InMemoryStore};
pub use traits::{CacheStore, FlagStore};

#[cfg(feature = "redis")]
pub use redis_backend::{RedisCache, RedisStore};

#[cfg(feature = "memcached")]
pub use memcached_backend::MemcachedCache;
