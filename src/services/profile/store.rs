// Profile store: cached read path plus batch recompute.
//
// `get_profile` never fails a ranking request: a data-source outage
// yields a neutral default profile. Computed profiles are written back
// to cache and replaced atomically as whole records.

use chrono::Duration;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::services::aggregate_cache::{AggregateCache, UserActivityPattern};
use crate::services::collaborators::{CoachLinks, EngagementSource, TenantConfigStore};

use super::{ProfileBuilder, ProfileBuilderConfig, UserProfile};

/// Number of users between progress log lines during a batch recompute.
const RECOMPUTE_COMMIT_INTERVAL: usize = 50;

struct CachedProfile {
    profile: UserProfile,
    stored_at: Instant,
}

pub struct ProfileStore {
    engagement: Arc<dyn EngagementSource>,
    tenant_config: Arc<dyn TenantConfigStore>,
    aggregates: Arc<AggregateCache>,
    builder: ProfileBuilder,
    builder_config: ProfileBuilderConfig,
    cache: DashMap<(Uuid, Uuid), CachedProfile>,
    ttl: std::time::Duration,
}

#[derive(Debug, Clone, Default)]
pub struct RecomputeStats {
    pub users_processed: usize,
    pub users_succeeded: usize,
    pub users_failed: usize,
}

impl ProfileStore {
    pub fn new(
        engagement: Arc<dyn EngagementSource>,
        tenant_config: Arc<dyn TenantConfigStore>,
        aggregates: Arc<AggregateCache>,
        cache_config: &CacheConfig,
    ) -> Self {
        let builder_config = ProfileBuilderConfig::default();
        Self {
            engagement,
            tenant_config,
            aggregates,
            builder: ProfileBuilder::new(builder_config.clone()),
            builder_config,
            cache: DashMap::new(),
            ttl: std::time::Duration::from_secs(cache_config.profile_ttl_secs),
        }
    }

    /// Cached profile if present and fresh, otherwise computed on demand.
    /// Data-source failures degrade to a neutral default profile.
    pub async fn get_profile(&self, user_id: Uuid, tenant_id: Uuid) -> UserProfile {
        let key = (user_id, tenant_id);
        if let Some(entry) = self.cache.get(&key) {
            if entry.stored_at.elapsed() < self.ttl {
                return entry.profile.clone();
            }
        }

        match self.compute_profile(user_id, tenant_id).await {
            Some(profile) => {
                self.replace(profile.clone());
                profile
            }
            None => {
                // Not cached: the next request retries the data sources
                warn!(
                    user_id = %user_id,
                    tenant_id = %tenant_id,
                    "Profile data sources unavailable, serving neutral default"
                );
                UserProfile::neutral_default(user_id, tenant_id)
            }
        }
    }

    async fn compute_profile(&self, user_id: Uuid, tenant_id: Uuid) -> Option<UserProfile> {
        let lookback = Duration::days(self.builder_config.lookback_days);

        let events = match self
            .engagement
            .fetch_user_events(user_id, tenant_id, lookback)
            .await
        {
            Ok(events) => events,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Engagement fetch failed");
                return None;
            }
        };

        let pattern = self
            .aggregates
            .user_pattern(user_id, tenant_id)
            .await
            .unwrap_or_else(|| UserActivityPattern::from_events(&events));

        // Coach links degrade to empty rather than failing the profile
        let coach_links = match self.tenant_config.coach_links(user_id, tenant_id).await {
            Ok(links) => links,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Coach link fetch failed");
                CoachLinks::default()
            }
        };

        let version = self
            .cache
            .get(&(user_id, tenant_id))
            .map(|entry| entry.profile.version + 1)
            .unwrap_or(1);

        let profile = self
            .builder
            .build(user_id, tenant_id, &events, &pattern, coach_links, version);

        if let Err(e) = profile.validate() {
            warn!(user_id = %user_id, error = %e, "Built profile failed validation");
            return None;
        }

        debug!(
            user_id = %user_id,
            version = profile.version,
            interests = profile.interest_distribution.len(),
            "Computed user profile"
        );
        Some(profile)
    }

    /// Atomic whole-record replacement of a cache entry.
    pub fn replace(&self, profile: UserProfile) {
        self.cache.insert(
            (profile.user_id, profile.tenant_id),
            CachedProfile {
                profile,
                stored_at: Instant::now(),
            },
        );
    }

    /// Eager invalidation hook for qualifying engagement writes.
    pub fn invalidate(&self, user_id: Uuid, tenant_id: Uuid) {
        self.cache.remove(&(user_id, tenant_id));
        self.aggregates.invalidate_user_pattern(user_id, tenant_id);
    }

    /// Recompute every active user's profile for a tenant. One user's
    /// failure never aborts the batch; progress is committed (cache
    /// replaced and logged) incrementally.
    pub async fn recompute_all(&self, tenant_id: Uuid) -> RecomputeStats {
        let mut stats = RecomputeStats::default();

        let users = match self.engagement.active_users(tenant_id).await {
            Ok(users) => users,
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "Active user fetch failed");
                return stats;
            }
        };

        info!(
            tenant_id = %tenant_id,
            user_count = users.len(),
            "Starting profile recompute"
        );

        for user_id in users {
            stats.users_processed += 1;

            match self.compute_profile(user_id, tenant_id).await {
                Some(profile) => {
                    self.replace(profile);
                    stats.users_succeeded += 1;
                }
                None => {
                    stats.users_failed += 1;
                    warn!(
                        user_id = %user_id,
                        tenant_id = %tenant_id,
                        "Profile recompute failed for user, continuing"
                    );
                }
            }

            if stats.users_processed % RECOMPUTE_COMMIT_INTERVAL == 0 {
                info!(
                    tenant_id = %tenant_id,
                    processed = stats.users_processed,
                    succeeded = stats.users_succeeded,
                    "Profile recompute progress"
                );
            }
        }

        info!(
            tenant_id = %tenant_id,
            processed = stats.users_processed,
            succeeded = stats.users_succeeded,
            failed = stats.users_failed,
            "Profile recompute completed"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::models::{ContentType, EngagementAction, EngagementEvent};
    use crate::services::collaborators::{InMemoryEngagementSource, InMemoryTenantConfig};
    use chrono::Utc;

    fn make_store(
        source: Arc<InMemoryEngagementSource>,
    ) -> (ProfileStore, Arc<InMemoryTenantConfig>) {
        let tenant_config = Arc::new(InMemoryTenantConfig::new());
        let cache_config = CacheConfig::default();
        let aggregates = Arc::new(AggregateCache::new(source.clone(), &cache_config));
        let store = ProfileStore::new(source, tenant_config.clone(), aggregates, &cache_config);
        (store, tenant_config)
    }

    fn like_event(user: Uuid, tenant: Uuid, tag: &str) -> EngagementEvent {
        EngagementEvent {
            user_id: user,
            item_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            tenant_id: tenant,
            action: EngagementAction::Like,
            content_type: ContentType::Post,
            tags: vec![tag.to_string()],
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_profile_computes_and_caches() {
        let source = Arc::new(InMemoryEngagementSource::new());
        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        source.record_event(like_event(user, tenant, "strength"));

        let (store, _) = make_store(source);

        let profile = store.get_profile(user, tenant).await;
        assert_eq!(profile.primary_interest.as_deref(), Some("strength"));
        assert_eq!(profile.version, 1);

        // Cached read returns the identical record
        let again = store.get_profile(user, tenant).await;
        assert_eq!(again.computed_at, profile.computed_at);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_neutral_profile() {
        let source = Arc::new(InMemoryEngagementSource::new());
        let (store, _) = make_store(source);

        let profile = store.get_profile(Uuid::new_v4(), Uuid::new_v4()).await;
        profile.validate().unwrap();
        assert!(profile.interest_distribution.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let source = Arc::new(InMemoryEngagementSource::new());
        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        source.record_event(like_event(user, tenant, "strength"));

        let (store, _) = make_store(source.clone());

        let first = store.get_profile(user, tenant).await;
        source.record_event(like_event(user, tenant, "yoga"));
        store.invalidate(user, tenant);

        let second = store.get_profile(user, tenant).await;
        assert_eq!(second.version, first.version + 1);
        assert!(second.interest_distribution.contains_key("yoga"));
    }

    #[tokio::test]
    async fn test_recompute_all_processes_active_users() {
        let source = Arc::new(InMemoryEngagementSource::new());
        let tenant = Uuid::new_v4();
        let users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for user in &users {
            source.record_event(like_event(*user, tenant, "cardio"));
        }

        let (store, _) = make_store(source);
        let stats = store.recompute_all(tenant).await;

        assert_eq!(stats.users_processed, 3);
        assert_eq!(stats.users_succeeded, 3);
        assert_eq!(stats.users_failed, 0);
    }
}
