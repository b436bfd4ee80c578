//! Backend connection configuration.

use crate::error::{StoreError, StoreResult};
use std::fmt;
use std::time::Duration;

/// Networked backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Redis backend
    Redis,
    /// Memcached backend
    Memcached,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Redis => write!(f, "Redis"),
            Backend::Memcached => write!(f, "Memcached"),
        }
    }
}

/// Connection configuration for a networked store or cache.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend type
    pub backend: Backend,

    /// Connection URL
    pub url: String,

    /// Connection timeout
    pub connection_timeout: Duration,

    /// Per-operation timeout
    pub operation_timeout: Duration,
}

impl StoreConfig {
    /// Create a new Redis configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use rollout_store::StoreConfig;
    ///
    /// let config = StoreConfig::redis("redis://localhost:6379").unwrap();
    /// ```
    pub fn redis(url: impl Into<String>) -> StoreResult<Self> {
        let url = url.into();
        if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
            return Err(StoreError::InvalidUrl(format!(
                "Invalid Redis URL: {}. Expected format: 'redis://host:port'",
                url
            )));
        }
        Ok(Self::with_backend(Backend::Redis, url))
    }

    /// Create a new Memcached configuration.
    ///
    /// Accepts both `memcache://host:port` and a bare `host:port`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rollout_store::StoreConfig;
    ///
    /// let config = StoreConfig::memcached("localhost:11211").unwrap();
    /// assert_eq!(config.url, "memcache://localhost:11211");
    /// ```
    pub fn memcached(url: impl Into<String>) -> StoreResult<Self> {
        let url = url.into();
        let url = if url.starts_with("memcache://") {
            url
        } else if url.contains(':') {
            format!("memcache://{}", url)
        } else {
            return Err(StoreError::InvalidUrl(format!(
                "Invalid Memcached URL: {}. Expected format: 'memcache://host:port' or 'host:port'",
                url
            )));
        };
        Ok(Self::with_backend(Backend::Memcached, url))
    }

    fn with_backend(backend: Backend, url: String) -> Self {
        Self {
            backend,
            url,
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(3),
        }
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}
