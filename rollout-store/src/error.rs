//! Error types for store and cache operations.

use thiserror::Error;

/// Result type for store and cache operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Transport and backend errors.
///
/// A key that does not exist is never an error: reads report it as
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis-specific error
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Memcached-specific error
    #[cfg(feature = "memcached")]
    #[error("Memcached error: {0}")]
    Memcached(#[from] memcache::MemcacheError),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,

    /// A set operation was issued against a string key, or the reverse
    #[error("Wrong type for key: {0}")]
    WrongType(String),

    /// Generic error
    #[error("Store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Check if this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            #[cfg(feature = "redis")]
            Self::Redis(e) => e.is_timeout() || e.is_connection_dropped() || e.is_io_error(),
            _ => false,
        }
    }
}

impl From<tokio::time::error::Elapsed> for StoreError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::Timeout
    }
}
