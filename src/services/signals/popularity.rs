// Popularity: engagement normalized against tenant percentile baselines.
//
//   score = 0.5 * velocity_term + 0.3 * engagement_term + 0.2 * rate_term
//
// velocity_term:   engagements/hour vs the tenant's p90 velocity
// engagement_term: absolute engagement vs the tenant's p90 engagement
// rate_term:       engagement/views vs a fixed target rate
//
// Each sub-term is capped at 1.0. A missing baseline (too few recent
// items, cache recompute failed) makes the affected sub-term neutral.

use chrono::{DateTime, Utc};

use crate::models::CandidateItem;
use crate::services::aggregate_cache::AggregateBaseline;
use crate::utils::normalize_capped;

use super::NEUTRAL;

const VELOCITY_WEIGHT: f64 = 0.5;
const ENGAGEMENT_WEIGHT: f64 = 0.3;
const RATE_WEIGHT: f64 = 0.2;

/// Fixed target for the engagement-per-view sub-term.
const TARGET_ENGAGEMENT_RATE: f64 = 0.1;

pub fn popularity(
    candidate: &CandidateItem,
    baseline: Option<&AggregateBaseline>,
    now: DateTime<Utc>,
) -> f64 {
    let engagement = candidate.engagement_total() as f64;
    let age_hours = candidate.age_hours(now).max(1.0);
    let velocity = engagement / age_hours;

    let (velocity_term, engagement_term) = match baseline {
        Some(b) => (
            normalize_capped(velocity, b.p90_velocity),
            normalize_capped(engagement, b.p90_engagement),
        ),
        None => (NEUTRAL, NEUTRAL),
    };

    let rate_term = if candidate.view_count > 0 {
        normalize_capped(engagement / candidate.view_count as f64, TARGET_ENGAGEMENT_RATE)
    } else {
        NEUTRAL
    };

    (VELOCITY_WEIGHT * velocity_term
        + ENGAGEMENT_WEIGHT * engagement_term
        + RATE_WEIGHT * rate_term)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::candidate;
    use uuid::Uuid;

    fn baseline(tenant: Uuid, p90_velocity: f64, p90_engagement: f64) -> AggregateBaseline {
        AggregateBaseline {
            tenant_id: tenant,
            p50_velocity: p90_velocity / 2.0,
            p90_velocity,
            p50_engagement: p90_engagement / 2.0,
            p90_engagement,
            sample_size: 100,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn test_velocity_at_p90_saturates_trending_term() {
        let tenant = Uuid::new_v4();
        let now = Utc::now();
        // p90 velocity 10/h; candidate accrued 60 engagements in 6 hours
        let b = baseline(tenant, 10.0, 1000.0);
        let mut item = candidate(tenant, &[], 6);
        item.like_count = 40;
        item.comment_count = 20;
        item.view_count = 600;

        let score = popularity(&item, Some(&b), now);
        // velocity term capped at 1.0; engagement 60/1000; rate 0.1/0.1 = 1.0
        let expected = 0.5 * 1.0 + 0.3 * 0.06 + 0.2 * 1.0;
        assert!((score - expected).abs() < 0.02);
    }

    #[test]
    fn test_missing_baseline_is_neutral() {
        let tenant = Uuid::new_v4();
        let now = Utc::now();
        let mut item = candidate(tenant, &[], 2);
        item.like_count = 5;
        item.view_count = 100;

        let score = popularity(&item, None, now);
        // velocity and engagement neutral, rate = 0.05/0.1 = 0.5
        let expected = 0.5 * NEUTRAL + 0.3 * NEUTRAL + 0.2 * 0.5;
        assert!((score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_views_rate_is_neutral() {
        let tenant = Uuid::new_v4();
        let item = candidate(tenant, &[], 2);
        let score = popularity(&item, None, Utc::now());
        assert!((score - NEUTRAL).abs() < 1e-9);
    }

    #[test]
    fn test_bounded_under_extreme_engagement() {
        let tenant = Uuid::new_v4();
        let b = baseline(tenant, 1.0, 10.0);
        let mut item = candidate(tenant, &[], 1);
        item.like_count = 100_000;
        item.view_count = 100;

        let score = popularity(&item, Some(&b), Utc::now());
        assert!((0.0..=1.0).contains(&score));
    }
}
