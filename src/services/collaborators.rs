// External collaborator seams.
//
// The ranking engine consumes read-only data from the content store, the
// engagement event source and the tenant config store. These traits are
// the only coupling points; production deployments back them with service
// clients, tests and local runs use the in-memory implementations below.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CandidateItem, EngagementEvent, ItemEngagement, Visibility};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data from collaborator: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, CollaboratorError>;

/// Read-only access to the content store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch a visibility-filtered candidate superset for a tenant,
    /// excluding the requester's own items and anything older than the
    /// retention window.
    async fn fetch_candidates(
        &self,
        tenant_id: Uuid,
        requester_id: Uuid,
        window: Duration,
        limit: usize,
    ) -> Result<Vec<CandidateItem>>;

    async fn fetch_item(&self, tenant_id: Uuid, item_id: Uuid) -> Result<Option<CandidateItem>>;
}

/// Read-only access to the engagement event source.
#[async_trait]
pub trait EngagementSource: Send + Sync {
    /// Trailing-window events for one user, newest first not guaranteed.
    async fn fetch_user_events(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        lookback: Duration,
    ) -> Result<Vec<EngagementEvent>>;

    /// Per-item engagement summaries over a rolling window, used to
    /// compute tenant percentile baselines.
    async fn fetch_tenant_engagement(
        &self,
        tenant_id: Uuid,
        window: Duration,
    ) -> Result<Vec<ItemEngagement>>;

    /// Users with any recent activity, for batch profile recomputes.
    async fn active_users(&self, tenant_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Tenant-level configuration consumed per request.
#[async_trait]
pub trait TenantConfigStore: Send + Sync {
    /// Active weight-profile name for the tenant, if configured.
    async fn weight_profile_name(&self, tenant_id: Uuid) -> Result<Option<String>>;

    /// Coach relationships: users coaching `user_id` (their designated
    /// mentors) and users `user_id` coaches.
    async fn coach_links(&self, user_id: Uuid, tenant_id: Uuid) -> Result<CoachLinks>;

    async fn active_tenants(&self) -> Result<Vec<Uuid>>;
}

#[derive(Debug, Clone, Default)]
pub struct CoachLinks {
    /// Users who coach the requester.
    pub coaches: Vec<Uuid>,
    /// Users the requester coaches.
    pub coachees: Vec<Uuid>,
}

// ------------------------------------------------------------------
// In-memory implementations (tests and local runs)
// ------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryContentStore {
    items: DashMap<Uuid, CandidateItem>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: CandidateItem) {
        self.items.insert(item.id, item);
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn fetch_candidates(
        &self,
        tenant_id: Uuid,
        requester_id: Uuid,
        window: Duration,
        limit: usize,
    ) -> Result<Vec<CandidateItem>> {
        let cutoff = Utc::now() - window;
        let mut candidates: Vec<CandidateItem> = self
            .items
            .iter()
            .filter(|entry| {
                let item = entry.value();
                item.tenant_id == tenant_id
                    && item.author_id != requester_id
                    && item.created_at >= cutoff
                    && item.visibility != Visibility::Private
            })
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first; the superset is bounded before scoring
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn fetch_item(&self, tenant_id: Uuid, item_id: Uuid) -> Result<Option<CandidateItem>> {
        Ok(self
            .items
            .get(&item_id)
            .filter(|item| item.tenant_id == tenant_id)
            .map(|item| item.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryEngagementSource {
    events: DashMap<Uuid, Vec<EngagementEvent>>,
    items: DashMap<Uuid, Vec<ItemEngagement>>,
}

impl InMemoryEngagementSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, event: EngagementEvent) {
        self.events
            .entry(event.tenant_id)
            .or_default()
            .push(event);
    }

    pub fn record_item_engagement(&self, tenant_id: Uuid, summary: ItemEngagement) {
        self.items.entry(tenant_id).or_default().push(summary);
    }
}

#[async_trait]
impl EngagementSource for InMemoryEngagementSource {
    async fn fetch_user_events(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        lookback: Duration,
    ) -> Result<Vec<EngagementEvent>> {
        let cutoff = Utc::now() - lookback;
        Ok(self
            .events
            .get(&tenant_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.user_id == user_id && e.occurred_at >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_tenant_engagement(
        &self,
        tenant_id: Uuid,
        window: Duration,
    ) -> Result<Vec<ItemEngagement>> {
        let cutoff = Utc::now() - window;
        Ok(self
            .items
            .get(&tenant_id)
            .map(|items| {
                items
                    .iter()
                    .filter(|i| i.created_at >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn active_users(&self, tenant_id: Uuid) -> Result<Vec<Uuid>> {
        let mut users: Vec<Uuid> = self
            .events
            .get(&tenant_id)
            .map(|events| events.iter().map(|e| e.user_id).collect())
            .unwrap_or_default();
        users.sort();
        users.dedup();
        Ok(users)
    }
}

#[derive(Default)]
pub struct InMemoryTenantConfig {
    weight_profiles: DashMap<Uuid, String>,
    coach_links: DashMap<(Uuid, Uuid), CoachLinks>,
    tenants: DashMap<Uuid, ()>,
}

impl InMemoryTenantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_weight_profile(&self, tenant_id: Uuid, name: &str) {
        self.tenants.insert(tenant_id, ());
        self.weight_profiles.insert(tenant_id, name.to_string());
    }

    pub fn register_tenant(&self, tenant_id: Uuid) {
        self.tenants.insert(tenant_id, ());
    }

    pub fn set_coach_links(&self, user_id: Uuid, tenant_id: Uuid, links: CoachLinks) {
        self.coach_links.insert((user_id, tenant_id), links);
    }
}

#[async_trait]
impl TenantConfigStore for InMemoryTenantConfig {
    async fn weight_profile_name(&self, tenant_id: Uuid) -> Result<Option<String>> {
        Ok(self.weight_profiles.get(&tenant_id).map(|n| n.clone()))
    }

    async fn coach_links(&self, user_id: Uuid, tenant_id: Uuid) -> Result<CoachLinks> {
        Ok(self
            .coach_links
            .get(&(user_id, tenant_id))
            .map(|l| l.clone())
            .unwrap_or_default())
    }

    async fn active_tenants(&self) -> Result<Vec<Uuid>> {
        Ok(self.tenants.iter().map(|entry| *entry.key()).collect())
    }
}

/// Interaction counts per author within the trailing window, derived
/// from raw events. Shared by the profile builders.
pub fn author_interaction_counts(events: &[EngagementEvent]) -> HashMap<Uuid, u32> {
    let mut counts: HashMap<Uuid, u32> = HashMap::new();
    for event in events {
        if event.action.is_engagement() {
            *counts.entry(event.author_id).or_insert(0) += 1;
        }
    }
    counts
}

/// Last activity timestamp across a user's events.
pub fn last_activity(events: &[EngagementEvent]) -> Option<DateTime<Utc>> {
    events.iter().map(|e| e.occurred_at).max()
}
