//! Error types for feature evaluation.

use rollout_store::StoreError;
use thiserror::Error;

/// Result type for rollout operations.
pub type RolloutResult<T> = Result<T, RolloutError>;

/// Errors surfaced by the evaluator.
#[derive(Debug, Error)]
pub enum RolloutError {
    /// The durable store or cache failed (transport, timeout, type mismatch)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A stored percentage is not an unsigned decimal integer
    #[error("Invalid percentage at {key}: {value:?}")]
    InvalidPercentage { key: String, value: String },

    /// A cache record could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RolloutError {
    /// Whether the failure came from the store or cache transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
