//! The feature flag evaluator.

use crate::config::RolloutConfig;
use crate::entry::ValueKind;
use crate::error::RolloutResult;
use crate::group::GroupRegistry;
use crate::keys::{Dimension, KeyNamer};
use crate::percentage;
use crate::sync::CacheSync;
use crate::user::{User, member_id};
use chrono::{DateTime, Utc};
use rollout_store::{CacheStore, FlagStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Decides whether features are active for users.
///
/// A feature is active for a user when the user is in an activated group,
/// is explicitly activated, or falls inside the activated percentage, and
/// the current instant falls inside the percentage-of-time window (if one
/// is set).
pub struct Rollout {
    sync: CacheSync,
    keys: KeyNamer,
    groups: GroupRegistry,
    config: RolloutConfig,
}

/// Snapshot of a feature's activation dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureState {
    pub groups: BTreeSet<String>,
    pub users: BTreeSet<String>,
    pub percentage: Option<u64>,
    pub percentage_of_time: Option<u64>,
}

impl Rollout {
    /// Create an evaluator reading straight from `store`.
    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self::with_config(store, None, RolloutConfig::default())
    }

    /// Create an evaluator with a cache in front of `store`.
    pub fn with_cache(store: Arc<dyn FlagStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self::with_config(store, Some(cache), RolloutConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(
        store: Arc<dyn FlagStore>,
        cache: Option<Arc<dyn CacheStore>>,
        config: RolloutConfig,
    ) -> Self {
        Self {
            sync: CacheSync::new(store, cache, config.cache_ttl),
            keys: KeyNamer::new(config.namespace.clone()),
            groups: GroupRegistry::new(),
            config,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.keys.namespace()
    }

    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    /// Register or replace a group predicate.
    pub fn define_group<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&dyn User) -> bool + Send + Sync + 'static,
    {
        self.groups.define(name, predicate);
    }

    fn key(&self, feature: &str, dimension: Dimension) -> String {
        self.keys.key(feature, dimension)
    }

    // ========== Activation ==========

    pub async fn activate_group(&self, feature: &str, group: &str) -> RolloutResult<()> {
        let key = self.key(feature, Dimension::Groups);
        debug!(feature, group, "Activating group");
        self.sync.store().set_add(&key, group).await?;
        self.sync.refresh(&key, ValueKind::Set).await
    }

    pub async fn deactivate_group(&self, feature: &str, group: &str) -> RolloutResult<()> {
        let key = self.key(feature, Dimension::Groups);
        debug!(feature, group, "Deactivating group");
        self.sync.store().set_remove(&key, group).await?;
        self.sync.refresh(&key, ValueKind::Set).await
    }

    pub async fn activate_user(&self, feature: &str, user: &dyn User) -> RolloutResult<()> {
        let key = self.key(feature, Dimension::Users);
        let member = member_id(user);
        debug!(feature, user = user.id(), "Activating user");
        self.sync.store().set_add(&key, &member).await?;
        self.sync.refresh(&key, ValueKind::Set).await
    }

    pub async fn deactivate_user(&self, feature: &str, user: &dyn User) -> RolloutResult<()> {
        let key = self.key(feature, Dimension::Users);
        let member = member_id(user);
        debug!(feature, user = user.id(), "Deactivating user");
        self.sync.store().set_remove(&key, &member).await?;
        self.sync.refresh(&key, ValueKind::Set).await
    }

    /// Activate `feature` for users whose bucket is below `percentage`.
    pub async fn activate_percentage(&self, feature: &str, percentage: u8) -> RolloutResult<()> {
        let key = self.key(feature, Dimension::Percentage);
        debug!(feature, percentage, "Activating percentage");
        self.sync.store().set(&key, percentage.to_string()).await?;
        self.sync.refresh(&key, ValueKind::Text).await
    }

    pub async fn deactivate_percentage(&self, feature: &str) -> RolloutResult<()> {
        let key = self.key(feature, Dimension::Percentage);
        debug!(feature, "Deactivating percentage");
        self.sync.store().delete(&key).await?;
        self.sync.expire(&[key.as_str()]).await
    }

    /// Restrict `feature` to the seconds whose bucket is below `percentage`.
    pub async fn activate_percentage_of_time(
        &self,
        feature: &str,
        percentage: u8,
    ) -> RolloutResult<()> {
        let key = self.key(feature, Dimension::PercentageOfTime);
        debug!(feature, percentage, "Activating percentage of time");
        self.sync.store().set(&key, percentage.to_string()).await?;
        self.sync.refresh(&key, ValueKind::Text).await
    }

    pub async fn deactivate_percentage_of_time(&self, feature: &str) -> RolloutResult<()> {
        let key = self.key(feature, Dimension::PercentageOfTime);
        debug!(feature, "Deactivating percentage of time");
        self.sync.store().delete(&key).await?;
        self.sync.expire(&[key.as_str()]).await
    }

    /// Clear the groups, users, and percentage of `feature`.
    ///
    /// The percentage-of-time window is kept unless
    /// [`RolloutConfig::clear_time_percentage_on_deactivate_all`] is set.
    pub async fn deactivate_all(&self, feature: &str) -> RolloutResult<()> {
        let mut keys = vec![
            self.key(feature, Dimension::Groups),
            self.key(feature, Dimension::Users),
            self.key(feature, Dimension::Percentage),
        ];
        if self.config.clear_time_percentage_on_deactivate_all {
            keys.push(self.key(feature, Dimension::PercentageOfTime));
        }
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

        debug!(feature, "Deactivating all");
        self.sync.store().delete_many(&keys).await?;
        self.sync.expire(&keys).await
    }

    // ========== Values ==========

    pub async fn get_value(&self, name: &str) -> RolloutResult<Option<String>> {
        let key = self.key(name, Dimension::Value);
        Ok(self
            .sync
            .read(&key, ValueKind::Text)
            .await?
            .and_then(|value| value.into_text()))
    }

    pub async fn store_value(&self, name: &str, value: impl Into<String>) -> RolloutResult<()> {
        let key = self.key(name, Dimension::Value);
        debug!(feature = name, "Storing value");
        self.sync.store().set(&key, value.into()).await?;
        self.sync.refresh(&key, ValueKind::Text).await
    }

    // ========== Evaluation ==========

    /// Whether `feature` is active for `user` right now.
    pub async fn active(&self, feature: &str, user: &dyn User) -> RolloutResult<bool> {
        self.active_at(feature, user, Utc::now()).await
    }

    /// Whether `feature` is active for `user` at instant `at`.
    pub async fn active_at(
        &self,
        feature: &str,
        user: &dyn User,
        at: DateTime<Utc>,
    ) -> RolloutResult<bool> {
        let targeted = self.user_in_active_group(feature, user).await?
            || self.user_active(feature, user).await?
            || self.user_within_active_percentage(feature, user).await?;

        if !targeted {
            return Ok(false);
        }
        self.within_active_percentage_of_time(feature, at).await
    }

    /// Read every activation dimension of `feature`.
    pub async fn feature_state(&self, feature: &str) -> RolloutResult<FeatureState> {
        Ok(FeatureState {
            groups: self.members(feature, Dimension::Groups).await?,
            users: self.members(feature, Dimension::Users).await?,
            percentage: self.percentage(feature, Dimension::Percentage).await?,
            percentage_of_time: self
                .percentage(feature, Dimension::PercentageOfTime)
                .await?,
        })
    }

    async fn members(
        &self,
        feature: &str,
        dimension: Dimension,
    ) -> RolloutResult<BTreeSet<String>> {
        let key = self.key(feature, dimension);
        Ok(self
            .sync
            .read(&key, ValueKind::Set)
            .await?
            .and_then(|value| value.into_members())
            .unwrap_or_default())
    }

    async fn percentage(&self, feature: &str, dimension: Dimension) -> RolloutResult<Option<u64>> {
        let key = self.key(feature, dimension);
        match self.sync.read(&key, ValueKind::Text).await? {
            Some(value) => match value.into_text() {
                Some(raw) => percentage::parse(&key, &raw).map(Some),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    async fn user_in_active_group(&self, feature: &str, user: &dyn User) -> RolloutResult<bool> {
        let groups = self.members(feature, Dimension::Groups).await?;
        Ok(groups
            .iter()
            .any(|group| self.groups.matches(group, user).unwrap_or(false)))
    }

    async fn user_active(&self, feature: &str, user: &dyn User) -> RolloutResult<bool> {
        let member = member_id(user);
        if self.sync.has_cache() {
            let users = self.members(feature, Dimension::Users).await?;
            Ok(users.contains(&member))
        } else {
            let key = self.key(feature, Dimension::Users);
            Ok(self.sync.store().is_member(&key, &member).await?)
        }
    }

    async fn user_within_active_percentage(
        &self,
        feature: &str,
        user: &dyn User,
    ) -> RolloutResult<bool> {
        Ok(self
            .percentage(feature, Dimension::Percentage)
            .await?
            .is_some_and(|p| percentage::within_percentage(user.id(), p)))
    }

    async fn within_active_percentage_of_time(
        &self,
        feature: &str,
        at: DateTime<Utc>,
    ) -> RolloutResult<bool> {
        Ok(self
            .percentage(feature, Dimension::PercentageOfTime)
            .await?
            .is_none_or(|p| percentage::within_percentage_of_time(at, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rollout_store::{InMemoryCache, InMemoryStore};

    fn cached() -> (Rollout, Arc<InMemoryStore>, Arc<InMemoryCache>) {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let rollout = Rollout::with_cache(store.clone(), cache.clone());
        (rollout, store, cache)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    async fn active_at(rollout: &Rollout, id: u64, secs: i64) -> bool {
        rollout.active_at("video", &id, at(secs)).await.unwrap()
    }

    #[tokio::test]
    async fn test_group_activation() {
        let (mut rollout, _, _) = cached();
        rollout.define_group("fivesonly", |user: &dyn User| user.id() == 5);
        rollout.activate_group("chat", "fivesonly").await.unwrap();

        assert!(rollout.active("chat", &5u64).await.unwrap());
        assert!(!rollout.active("chat", &1u64).await.unwrap());
    }

    #[tokio::test]
    async fn test_undefined_group_is_inactive() {
        let (rollout, _, _) = cached();
        rollout.activate_group("chat", "fake").await.unwrap();
        assert!(!rollout.active("chat", &1u64).await.unwrap());
    }

    #[tokio::test]
    async fn test_all_group() {
        let (rollout, _, _) = cached();
        rollout.activate_group("chat", "all").await.unwrap();
        assert!(rollout.active("chat", &0u64).await.unwrap());
    }

    #[tokio::test]
    async fn test_deactivate_group_leaves_others() {
        let (mut rollout, _, _) = cached();
        rollout.define_group("fivesonly", |user: &dyn User| user.id() == 5);
        rollout.activate_group("chat", "all").await.unwrap();
        rollout.activate_group("chat", "fivesonly").await.unwrap();
        rollout.deactivate_group("chat", "all").await.unwrap();

        assert!(!rollout.active("chat", &10u64).await.unwrap());
        assert!(rollout.active("chat", &5u64).await.unwrap());
    }

    #[tokio::test]
    async fn test_users() {
        let (rollout, _, _) = cached();
        rollout.activate_user("chat", &42u64).await.unwrap();
        rollout.activate_user("chat", &24u64).await.unwrap();
        assert!(rollout.active("chat", &42u64).await.unwrap());
        assert!(!rollout.active("chat", &7u64).await.unwrap());

        rollout.deactivate_user("chat", &42u64).await.unwrap();
        assert!(!rollout.active("chat", &42u64).await.unwrap());
        assert!(rollout.active("chat", &24u64).await.unwrap());
    }

    #[tokio::test]
    async fn test_percentage_and_deactivation() {
        let (rollout, _, _) = cached();
        rollout.activate_percentage("chat", 100).await.unwrap();
        assert!(rollout.active("chat", &24u64).await.unwrap());

        rollout.deactivate_percentage("chat").await.unwrap();
        assert!(!rollout.active("chat", &24u64).await.unwrap());
    }

    #[tokio::test]
    async fn test_percentage_of_time_gates_other_dimensions() {
        let uncached = Rollout::new(Arc::new(InMemoryStore::new()));
        for rollout in [cached().0, uncached] {
            rollout.activate_group("video", "all").await.unwrap();

            // No window set: always passes
            assert!(active_at(&rollout, 1, 1_000_099).await);

            rollout
                .activate_percentage_of_time("video", 10)
                .await
                .unwrap();
            assert!(active_at(&rollout, 1, 1_000_009).await);
            assert!(!active_at(&rollout, 1, 1_000_010).await);

            rollout
                .deactivate_percentage_of_time("video")
                .await
                .unwrap();
            assert!(active_at(&rollout, 1, 1_000_010).await);
        }
    }

    #[tokio::test]
    async fn test_percentage_of_users_and_time_without_cache() {
        let rollout = Rollout::new(Arc::new(InMemoryStore::new()));
        rollout.activate_percentage("video", 90).await.unwrap();
        rollout
            .activate_percentage_of_time("video", 10)
            .await
            .unwrap();

        assert!(active_at(&rollout, 5, 1_000_005).await);
        assert!(!active_at(&rollout, 95, 1_000_005).await);
        assert!(!active_at(&rollout, 5, 1_000_050).await);
    }

    #[tokio::test]
    async fn test_time_window_alone_activates_nobody() {
        let (rollout, _, _) = cached();
        rollout
            .activate_percentage_of_time("video", 100)
            .await
            .unwrap();
        assert!(!active_at(&rollout, 1, 0).await);
    }

    #[tokio::test]
    async fn test_deactivate_all_keeps_time_window() {
        let (rollout, store, _) = cached();
        rollout.activate_group("chat", "all").await.unwrap();
        rollout
            .activate_percentage_of_time("chat", 50)
            .await
            .unwrap();
        rollout.deactivate_all("chat").await.unwrap();

        let state = rollout.feature_state("chat").await.unwrap();
        assert_eq!(
            state,
            FeatureState {
                percentage_of_time: Some(50),
                ..FeatureState::default()
            }
        );
        assert_eq!(
            store.get("feature:chat:time_percentage").await.unwrap(),
            Some("50".to_string())
        );
    }

    #[tokio::test]
    async fn test_deactivate_all_can_clear_time_window() {
        let store = Arc::new(InMemoryStore::new());
        let config = RolloutConfig::new().with_deactivate_all_clearing_time(true);
        let rollout = Rollout::with_config(store.clone(), None, config);

        rollout
            .activate_percentage_of_time("chat", 50)
            .await
            .unwrap();
        rollout.deactivate_all("chat").await.unwrap();

        assert_eq!(
            rollout.feature_state("chat").await.unwrap(),
            FeatureState::default()
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_values() {
        let (rollout, _, _) = cached();
        assert_eq!(rollout.get_value("banner").await.unwrap(), None);

        rollout.store_value("banner", "hello").await.unwrap();
        assert_eq!(
            rollout.get_value("banner").await.unwrap(),
            Some("hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_namespace() {
        let store = Arc::new(InMemoryStore::new());
        let config = RolloutConfig::new().with_namespace("staging");
        let rollout = Rollout::with_config(store.clone(), None, config);
        assert_eq!(rollout.namespace(), Some("staging"));

        rollout.activate_percentage("ui", 20).await.unwrap();
        assert_eq!(
            store.get("staging:feature:ui:percentage").await.unwrap(),
            Some("20".to_string())
        );
    }

    #[tokio::test]
    async fn test_feature_state() {
        let (rollout, _, _) = cached();
        rollout.activate_group("chat", "all").await.unwrap();
        rollout.activate_user("chat", &42u64).await.unwrap();
        rollout.activate_percentage("chat", 20).await.unwrap();

        let state = rollout.feature_state("chat").await.unwrap();
        assert_eq!(state.groups, BTreeSet::from(["all".to_string()]));
        assert_eq!(state.users, BTreeSet::from(["42".to_string()]));
        assert_eq!(state.percentage, Some(20));
        assert_eq!(state.percentage_of_time, None);
    }
}
