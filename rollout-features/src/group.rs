//! Named user groups.
//!
//! Only group *names* are persisted per feature. The predicate behind each
//! name lives in the registry and has to be registered the same way in
//! every process that evaluates flags.

use crate::user::User;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::warn;

/// Name of the built-in group that matches every user.
pub const ALL_GROUP: &str = "all";

/// Membership test for a group.
pub type GroupPredicate = Arc<dyn Fn(&dyn User) -> bool + Send + Sync>;

/// Mapping from group name to membership predicate.
#[derive(Clone)]
pub struct GroupRegistry {
    groups: HashMap<String, GroupPredicate>,
}

impl GroupRegistry {
    /// Create a registry holding only the `all` group.
    pub fn new() -> Self {
        let mut registry = Self {
            groups: HashMap::new(),
        };
        registry.define(ALL_GROUP, |_| true);
        registry
    }

    /// Register or replace the predicate for `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rollout_features::{GroupRegistry, User};
    ///
    /// let mut groups = GroupRegistry::new();
    /// groups.define("fivesonly", |user: &dyn User| user.id() == 5);
    /// assert!(groups.contains("fivesonly"));
    /// ```
    pub fn define<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&dyn User) -> bool + Send + Sync + 'static,
    {
        self.groups.insert(name.into(), Arc::new(predicate));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Evaluate group `name` for `user`.
    ///
    /// Returns `None` when no predicate is registered under `name`. A
    /// predicate that panics counts as not matching.
    pub fn matches(&self, name: &str, user: &dyn User) -> Option<bool> {
        let predicate = self.groups.get(name)?;
        match catch_unwind(AssertUnwindSafe(|| (**predicate)(user))) {
            Ok(matched) => Some(matched),
            Err(_) => {
                warn!(
                    group = name,
                    user = user.id(),
                    "Group predicate panicked, treating as no match"
                );
                Some(false)
            }
        }
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GroupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRegistry")
            .field("groups", &self.names())
            .finish()
    }
}
