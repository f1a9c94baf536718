// Read-through TTL cache for expensive, slowly-changing aggregates.
//
// Two key classes with independent TTLs:
// - tenant percentile baselines (engagement velocity / absolute engagement)
// - per-user behavior patterns (hour histogram, activity stats)
//
// TTL expiry is the sole invalidation mechanism for baselines; user
// patterns are additionally invalidated eagerly on engagement writes.
// A failed recompute never surfaces: callers receive `None` and fall
// back to neutral defaults.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::models::EngagementEvent;
use crate::services::collaborators::EngagementSource;

/// Per-tenant percentile statistics over a rolling engagement window.
#[derive(Debug, Clone)]
pub struct AggregateBaseline {
    pub tenant_id: Uuid,
    /// Engagement accrued per hour since creation, 50th percentile.
    pub p50_velocity: f64,
    /// Engagement per hour, 90th percentile.
    pub p90_velocity: f64,
    pub p50_engagement: f64,
    pub p90_engagement: f64,
    pub sample_size: usize,
    pub computed_at: DateTime<Utc>,
}

/// Per-user behavioral aggregates derived from the engagement stream.
#[derive(Debug, Clone)]
pub struct UserActivityPattern {
    pub hour_counts: [u32; 24],
    pub weekday_counts: [u32; 7],
    /// Distinct calendar days with any activity in the window.
    pub active_day_count: u32,
    pub engagement_count: u32,
    pub view_count: u32,
    pub last_activity: Option<DateTime<Utc>>,
}

impl UserActivityPattern {
    pub fn from_events(events: &[EngagementEvent]) -> Self {
        let mut hour_counts = [0u32; 24];
        let mut weekday_counts = [0u32; 7];
        let mut days: Vec<i32> = Vec::new();
        let mut engagement_count = 0;
        let mut view_count = 0;
        let mut last_activity = None;

        for event in events {
            hour_counts[event.occurred_at.hour() as usize] += 1;
            weekday_counts[event.occurred_at.weekday().num_days_from_sunday() as usize] += 1;
            days.push(event.occurred_at.num_days_from_ce());
            if event.action.is_engagement() {
                engagement_count += 1;
            } else {
                view_count += 1;
            }
            if last_activity.map_or(true, |t| event.occurred_at > t) {
                last_activity = Some(event.occurred_at);
            }
        }

        days.sort_unstable();
        days.dedup();

        Self {
            hour_counts,
            weekday_counts,
            active_day_count: days.len() as u32,
            engagement_count,
            view_count,
            last_activity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.engagement_count == 0 && self.view_count == 0
    }

    /// Hours ranked by activity, most active first. Hours with no
    /// activity are omitted.
    pub fn ranked_hours(&self) -> Vec<u8> {
        let mut hours: Vec<(u8, u32)> = self
            .hour_counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(h, &c)| (h as u8, c))
            .collect();
        hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        hours.into_iter().map(|(h, _)| h).collect()
    }

    /// Weekdays ranked by activity, most active first.
    pub fn ranked_weekdays(&self) -> Vec<u8> {
        let mut days: Vec<(u8, u32)> = self
            .weekday_counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(d, &c)| (d as u8, c))
            .collect();
        days.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        days.into_iter().map(|(d, _)| d).collect()
    }

    pub fn engagement_rate(&self) -> f64 {
        if self.view_count == 0 {
            return 0.0;
        }
        self.engagement_count as f64 / self.view_count as f64
    }
}

struct Cached<T> {
    value: T,
    stored_at: Instant,
}

pub struct AggregateCache {
    engagement: Arc<dyn EngagementSource>,
    baselines: DashMap<Uuid, Cached<AggregateBaseline>>,
    patterns: DashMap<(Uuid, Uuid), Cached<UserActivityPattern>>,
    baseline_ttl: std::time::Duration,
    pattern_ttl: std::time::Duration,
    /// Rolling window for baseline computation and user patterns.
    window: Duration,
}

impl AggregateCache {
    pub fn new(engagement: Arc<dyn EngagementSource>, config: &CacheConfig) -> Self {
        Self {
            engagement,
            baselines: DashMap::new(),
            patterns: DashMap::new(),
            baseline_ttl: std::time::Duration::from_secs(config.baseline_ttl_secs),
            pattern_ttl: std::time::Duration::from_secs(config.pattern_ttl_secs),
            window: Duration::days(30),
        }
    }

    /// Tenant baseline, recomputed on miss or TTL expiry. Returns `None`
    /// when the engagement source is unavailable or the sample is empty;
    /// callers substitute neutral sub-terms.
    pub async fn baseline(&self, tenant_id: Uuid) -> Option<AggregateBaseline> {
        if let Some(entry) = self.baselines.get(&tenant_id) {
            if entry.stored_at.elapsed() < self.baseline_ttl {
                return Some(entry.value.clone());
            }
        }

        match self.compute_baseline(tenant_id).await {
            Some(baseline) => {
                self.baselines.insert(
                    tenant_id,
                    Cached {
                        value: baseline.clone(),
                        stored_at: Instant::now(),
                    },
                );
                Some(baseline)
            }
            None => None,
        }
    }

    async fn compute_baseline(&self, tenant_id: Uuid) -> Option<AggregateBaseline> {
        let items = match self
            .engagement
            .fetch_tenant_engagement(tenant_id, self.window)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "Baseline recompute failed");
                return None;
            }
        };

        if items.is_empty() {
            debug!(tenant_id = %tenant_id, "No engagement data for baseline");
            return None;
        }

        let now = Utc::now();
        let mut velocities: Vec<f64> = Vec::with_capacity(items.len());
        let mut totals: Vec<f64> = Vec::with_capacity(items.len());

        for item in &items {
            let age_hours = ((now - item.created_at).num_minutes() as f64 / 60.0).max(1.0);
            velocities.push(item.engagement_total as f64 / age_hours);
            totals.push(item.engagement_total as f64);
        }

        velocities.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        totals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Some(AggregateBaseline {
            tenant_id,
            p50_velocity: percentile(&velocities, 0.50),
            p90_velocity: percentile(&velocities, 0.90),
            p50_engagement: percentile(&totals, 0.50),
            p90_engagement: percentile(&totals, 0.90),
            sample_size: items.len(),
            computed_at: now,
        })
    }

    /// Per-user activity pattern, recomputed on miss or TTL expiry.
    pub async fn user_pattern(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Option<UserActivityPattern> {
        let key = (user_id, tenant_id);
        if let Some(entry) = self.patterns.get(&key) {
            if entry.stored_at.elapsed() < self.pattern_ttl {
                return Some(entry.value.clone());
            }
        }

        let events = match self
            .engagement
            .fetch_user_events(user_id, tenant_id, self.window)
            .await
        {
            Ok(events) => events,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Pattern recompute failed");
                return None;
            }
        };

        let pattern = UserActivityPattern::from_events(&events);
        self.patterns.insert(
            key,
            Cached {
                value: pattern.clone(),
                stored_at: Instant::now(),
            },
        );
        Some(pattern)
    }

    /// Eager invalidation hook for qualifying engagement writes. Baselines
    /// are left to expire by TTL; bounded staleness is acceptable there.
    pub fn invalidate_user_pattern(&self, user_id: Uuid, tenant_id: Uuid) {
        self.patterns.remove(&(user_id, tenant_id));
    }
}

/// Nearest-rank percentile over a sorted slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((pct * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}
