//! Cache entries and their encoding.
//!
//! A cached document is one of three things: a set's members, a string
//! value, or a tombstone confirming the durable store has nothing for the
//! key. The variants are tagged in the JSON, so no stored value can ever be
//! mistaken for a tombstone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which shape a dimension is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Set,
    Text,
}

/// A value read from the durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Members(BTreeSet<String>),
    Text(String),
}

impl StoredValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            StoredValue::Members(_) => ValueKind::Set,
            StoredValue::Text(_) => ValueKind::Text,
        }
    }

    pub fn into_members(self) -> Option<BTreeSet<String>> {
        match self {
            StoredValue::Members(members) => Some(members),
            StoredValue::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            StoredValue::Text(text) => Some(text),
            StoredValue::Members(_) => None,
        }
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// The cache holds a value
    Hit(StoredValue),
    /// The cache confirms the store has no value; do not ask the store
    Tombstone,
    /// The cache knows nothing; ask the store
    Miss,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CacheRecord {
    Members(BTreeSet<String>),
    Text(String),
    Tombstone,
}

/// Encode what the store returned (or its absence) for the cache.
pub(crate) fn encode(value: Option<&StoredValue>) -> serde_json::Result<String> {
    let record = match value {
        Some(StoredValue::Members(members)) => CacheRecord::Members(members.clone()),
        Some(StoredValue::Text(text)) => CacheRecord::Text(text.clone()),
        None => CacheRecord::Tombstone,
    };
    serde_json::to_string(&record)
}

/// Decode a cached document, expecting `kind`.
///
/// Returns `None` when the document is unreadable or holds the other kind.
pub(crate) fn decode(raw: &str, kind: ValueKind) -> Option<CacheEntry> {
    let entry = match serde_json::from_str(raw).ok()? {
        CacheRecord::Tombstone => return Some(CacheEntry::Tombstone),
        CacheRecord::Members(members) => StoredValue::Members(members),
        CacheRecord::Text(text) => StoredValue::Text(text),
    };
    (entry.kind() == kind).then_some(CacheEntry::Hit(entry))
}
