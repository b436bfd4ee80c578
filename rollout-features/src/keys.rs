//! Storage key derivation.
//!
//! Keys are the only contract shared with pre-existing stores and caches,
//! so their byte layout must never change:
//! `[<namespace>:]feature:<name>:<dimension>`.

use std::fmt;

const DELIMITER: &str = ":";
const FEATURE_SEGMENT: &str = "feature";

/// One independently stored facet of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Set of activated group names
    Groups,
    /// Set of activated user ids
    Users,
    /// Percentage of users, as a decimal string
    Percentage,
    /// Percentage of time, as a decimal string
    PercentageOfTime,
    /// Auxiliary stored value
    Value,
}

impl Dimension {
    /// Key suffix for this dimension.
    pub fn tag(&self) -> &'static str {
        match self {
            Dimension::Groups => "groups",
            Dimension::Users => "users",
            Dimension::Percentage => "percentage",
            Dimension::PercentageOfTime => "time_percentage",
            Dimension::Value => "value",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Derives store and cache keys for features.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyNamer {
    namespace: Option<String>,
}

impl KeyNamer {
    pub fn new(namespace: Option<String>) -> Self {
        Self { namespace }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Build the key for `feature`'s `dimension`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rollout_features::{Dimension, KeyNamer};
    ///
    /// let keys = KeyNamer::new(Some("myapp".to_string()));
    /// assert_eq!(keys.key("chat", Dimension::Groups), "myapp:feature:chat:groups");
    /// ```
    pub fn key(&self, feature: &str, dimension: Dimension) -> String {
        let mut parts = Vec::with_capacity(4);
        if let Some(namespace) = &self.namespace {
            parts.push(namespace.as_str());
        }
        parts.extend([FEATURE_SEGMENT, feature, dimension.tag()]);
        parts.join(DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_without_namespace() {
        let keys = KeyNamer::default();
        assert_eq!(keys.key("chat", Dimension::Groups), "feature:chat:groups");
        assert_eq!(keys.key("chat", Dimension::Users), "feature:chat:users");
        assert_eq!(
            keys.key("chat", Dimension::Percentage),
            "feature:chat:percentage"
        );
        assert_eq!(
            keys.key("chat", Dimension::PercentageOfTime),
            "feature:chat:time_percentage"
        );
        assert_eq!(keys.key("chat", Dimension::Value), "feature:chat:value");
    }

    #[test]
    fn test_keys_with_namespace() {
        let keys = KeyNamer::new(Some("staging".to_string()));
        assert_eq!(keys.namespace(), Some("staging"));
        assert_eq!(
            keys.key("chat", Dimension::Users),
            "staging:feature:chat:users"
        );
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension::PercentageOfTime.to_string(), "time_percentage");
    }
}
