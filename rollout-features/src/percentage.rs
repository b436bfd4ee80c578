//! Percentage rollout arithmetic.
//!
//! A user falls in bucket `id % 100` and is inside a rollout of `p` percent
//! when `bucket < p`. Buckets never move, so raising `p` only ever adds users.

use crate::error::{RolloutError, RolloutResult};
use chrono::{DateTime, Utc};

/// Bucket (0-99) of a user id.
pub fn bucket(id: u64) -> u64 {
    id % 100
}

/// Whether user `id` is inside a rollout of `percentage`.
pub fn within_percentage(id: u64, percentage: u64) -> bool {
    bucket(id) < percentage
}

/// Bucket (0-99) of an instant, from whole seconds since the Unix epoch.
pub fn time_bucket(at: DateTime<Utc>) -> u64 {
    at.timestamp().rem_euclid(100).unsigned_abs()
}

/// Whether `at` falls inside a time-window rollout of `percentage`.
pub fn within_percentage_of_time(at: DateTime<Utc>, percentage: u64) -> bool {
    time_bucket(at) < percentage
}

/// Parse a stored percentage.
///
/// Only plain unsigned decimal integers are accepted. Values above 100 are
/// passed through and behave like 100 under the bucket comparison; values
/// too large for `u64` saturate.
pub fn parse(key: &str, raw: &str) -> RolloutResult<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(key, raw));
    }
    // All digits, so overflow is the only way to fail
    Ok(raw.parse().unwrap_or(u64::MAX))
}

fn invalid(key: &str, raw: &str) -> RolloutError {
    RolloutError::InvalidPercentage {
        key: key.to_string(),
        value: raw.to_string(),
    }
}
