//! Evaluator configuration.

use crate::error::{RolloutError, RolloutResult};
use std::env;
use std::time::Duration;

/// Environment variable holding the key namespace.
pub const ENV_NAMESPACE: &str = "ROLLOUT_NAMESPACE";
/// Environment variable holding the cache TTL in seconds.
pub const ENV_CACHE_TTL_SECS: &str = "ROLLOUT_CACHE_TTL_SECS";
/// Environment variable toggling whether `deactivate_all` clears the time window.
pub const ENV_DEACTIVATE_ALL_CLEARS_TIME: &str = "ROLLOUT_DEACTIVATE_ALL_CLEARS_TIME";

/// Rollout configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloutConfig {
    /// Prefix for every store and cache key
    pub namespace: Option<String>,

    /// TTL of synchronized cache entries (`None` never expires)
    pub cache_ttl: Option<Duration>,

    /// Whether `deactivate_all` also clears the percentage-of-time window.
    ///
    /// Off by default: the time window has its own lifecycle and survives a
    /// bulk deactivation.
    pub clear_time_percentage_on_deactivate_all: bool,
}

impl RolloutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `ROLLOUT_*` environment variables.
    ///
    /// # Environment Variables
    /// - `ROLLOUT_NAMESPACE` - key namespace (default: none)
    /// - `ROLLOUT_CACHE_TTL_SECS` - cache TTL in seconds, `0` for none (default: none)
    /// - `ROLLOUT_DEACTIVATE_ALL_CLEARS_TIME` - `1`/`true`/`0`/`false` (default: false)
    pub fn from_env() -> RolloutResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> RolloutResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = lookup(ENV_NAMESPACE).filter(|ns| !ns.is_empty());

        let cache_ttl = match lookup(ENV_CACHE_TTL_SECS) {
            None => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(RolloutError::Config(format!(
                        "{ENV_CACHE_TTL_SECS} must be whole seconds, got {raw:?}"
                    )));
                }
            },
        };

        let clear_time = match lookup(ENV_DEACTIVATE_ALL_CLEARS_TIME) {
            None => false,
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(RolloutError::Config(format!(
                        "{ENV_DEACTIVATE_ALL_CLEARS_TIME} must be a boolean, got {raw:?}"
                    )));
                }
            },
        };

        Ok(Self {
            namespace,
            cache_ttl,
            clear_time_percentage_on_deactivate_all: clear_time,
        })
    }

    /// Set the key namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Make `deactivate_all` clear the percentage-of-time window too.
    pub fn with_deactivate_all_clearing_time(mut self, clear: bool) -> Self {
        self.clear_time_percentage_on_deactivate_all = clear;
        self
    }
}
