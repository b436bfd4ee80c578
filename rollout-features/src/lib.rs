//! Feature Flags backed by a durable store
//!
//! Decides whether a feature is active for a user from four independently
//! stored dimensions, with an optional read-through cache kept coherent with
//! the store.
//!
//! # Features
//!
//! - 👥 **Groups** - Activate for every user matching a named predicate
//! - 🎯 **Users** - Activate for explicit user ids
//! - 🎲 **Percentage Rollout** - Stable `id % 100` buckets
//! - ⏱️ **Percentage of Time** - Gate everything above to a share of seconds
//! - 🪦 **Tombstones** - Cached "confirmed absent" entries spare the store
//!
//! # Quick Start
//!
//! ```
//! use rollout_features::*;
//! use rollout_store::{InMemoryCache, InMemoryStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> RolloutResult<()> {
//! let mut rollout = Rollout::with_cache(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(InMemoryCache::new()),
//! );
//!
//! // Groups are not persisted; register them at startup
//! rollout.define_group("staff", |user: &dyn User| user.id() < 100);
//!
//! rollout.activate_group("chat", "staff").await?;
//! rollout.activate_user("chat", &UserId(4242)).await?;
//! rollout.activate_percentage("chat", 20).await?;
//!
//! assert!(rollout.active("chat", &UserId(7)).await?);
//! assert!(rollout.active("chat", &UserId(4242)).await?);
//! assert!(!rollout.active("chat", &UserId(150)).await?);
//! # Ok(())
//! # }
//! ```
//!
//! # Percentage of Time
//!
//! ```
//! use rollout_features::*;
//! use rollout_store::InMemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> RolloutResult<()> {
//! let rollout = Rollout::new(Arc::new(InMemoryStore::new()));
//!
//! // 90% of users, 10% of the time
//! rollout.activate_percentage("search-v2", 90).await?;
//! rollout.activate_percentage_of_time("search-v2", 10).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod group;
pub mod keys;
pub mod percentage;
pub mod rollout;
pub mod sync;
pub mod user;

pub use config::RolloutConfig;
pub use entry::{CacheEntry, StoredValue, ValueKind};
pub use error::{RolloutError, RolloutResult};
pub use group::{ALL_GROUP, GroupPredicate, GroupRegistry};
pub use keys::{Dimension, KeyNamer};
pub use rollout::{FeatureState, Rollout};
pub use sync::CacheSync;
pub use user::{User, UserId};
