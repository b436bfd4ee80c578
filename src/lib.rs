// Rollout - feature flags over a durable store and a coherent cache
//
// Facade over the workspace crates: the evaluator lives in
// `rollout-features`, the store and cache seams in `rollout-store`.

pub use rollout_features::*;

pub use rollout_store;
pub use rollout_store::{
    CacheStore, FlagStore, InMemoryCache, InMemoryStore, StoreConfig, StoreError, StoreResult,
};

#[cfg(feature = "redis")]
pub use rollout_store::{RedisCache, RedisStore};

#[cfg(feature = "memcached")]
pub use rollout_store::MemcachedCache;

pub mod prelude {
    pub use rollout_features::{
        FeatureState, Rollout, RolloutConfig, RolloutError, RolloutResult, User, UserId,
    };
    pub use rollout_store::{CacheStore, FlagStore, InMemoryCache, InMemoryStore};
}
