// Profile builder pipeline.
//
// One pure builder per dimension, assembled into a whole `UserProfile`
// record by `ProfileBuilder::build`. Interest weights follow the decay
// formula:
//
//   weight = SUM(action_weight * daily_decay_rate^days_ago)
//
// then normalize to a distribution summing to 1.0. Dimensions without
// data fall back to the neutral defaults of `UserProfile::neutral_default`.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::models::{ContentType, EngagementEvent};
use crate::services::aggregate_cache::UserActivityPattern;
use crate::services::collaborators::{author_interaction_counts, last_activity, CoachLinks};
use crate::utils::normalize_distribution;

use super::{
    ActivityLevel, ActivityMetrics, SocialLevel, TemporalPreference, UserProfile, ValueTier,
    NEUTRAL_SCORE,
};

#[derive(Debug, Clone)]
pub struct ProfileBuilderConfig {
    pub lookback_days: i64,
    /// Daily retention of interest weight (0.95 = 5% decay per day).
    pub daily_decay_rate: f64,
    /// Interests below this decayed weight are dropped before
    /// normalization.
    pub min_weight_threshold: f64,
    pub max_interests: usize,
}

impl Default for ProfileBuilderConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            daily_decay_rate: 0.95,
            min_weight_threshold: 0.1,
            max_interests: 50,
        }
    }
}

pub struct ProfileBuilder {
    config: ProfileBuilderConfig,
}

impl ProfileBuilder {
    pub fn new(config: ProfileBuilderConfig) -> Self {
        Self { config }
    }

    /// Assemble a complete profile record from raw inputs. Pure: the
    /// same inputs always produce the same record (modulo `computed_at`).
    pub fn build(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        events: &[EngagementEvent],
        pattern: &UserActivityPattern,
        coach_links: CoachLinks,
        version: u32,
    ) -> UserProfile {
        if events.is_empty() && pattern.is_empty() {
            debug!(user_id = %user_id, "No engagement history, using neutral profile");
            let mut profile = UserProfile::neutral_default(user_id, tenant_id);
            profile.coaches = coach_links.coaches;
            profile.coachees = coach_links.coachees;
            profile.version = version;
            return profile;
        }

        let now = Utc::now();
        let (interest_distribution, primary_interest) = self.build_interests(events, now);
        let content_type_distribution = self.build_content_types(events, now);
        let (activity_level, activity_metrics) = self.build_activity(pattern, now);
        let temporal = self.build_temporal(pattern);
        let (social_level, social_score) = self.build_social(events);
        let author_interactions = author_interaction_counts(events);
        let value_tier = Self::classify_value_tier(pattern.engagement_count);
        let churn_risk = Self::estimate_churn_risk(last_activity(events), now);

        UserProfile {
            user_id,
            tenant_id,
            primary_interest,
            interest_distribution,
            activity_level,
            activity_metrics,
            temporal,
            goal: None,
            social_level,
            social_score,
            coaches: coach_links.coaches,
            coachees: coach_links.coachees,
            author_interactions,
            content_type_distribution,
            value_tier,
            churn_risk,
            location: None,
            version,
            computed_at: now,
        }
    }

    /// Interest distribution with exponential time decay per action.
    fn build_interests(
        &self,
        events: &[EngagementEvent],
        now: DateTime<Utc>,
    ) -> (HashMap<String, f64>, Option<String>) {
        let mut weights: HashMap<String, f64> = HashMap::new();

        for event in events {
            let days_ago = (now - event.occurred_at).num_hours() as f64 / 24.0;
            if days_ago > self.config.lookback_days as f64 {
                continue;
            }
            let decayed = event.action.weight() * self.config.daily_decay_rate.powf(days_ago);
            for tag in &event.tags {
                *weights.entry(tag.clone()).or_insert(0.0) += decayed;
            }
        }

        weights.retain(|_, w| *w >= self.config.min_weight_threshold);

        if weights.len() > self.config.max_interests {
            let mut ranked: Vec<(String, f64)> = weights.into_iter().collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            ranked.truncate(self.config.max_interests);
            weights = ranked.into_iter().collect();
        }

        normalize_distribution(&mut weights);

        let primary = weights
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(tag, _)| tag.clone());

        (weights, primary)
    }

    fn build_content_types(
        &self,
        events: &[EngagementEvent],
        now: DateTime<Utc>,
    ) -> HashMap<ContentType, f64> {
        let mut weights: HashMap<ContentType, f64> = HashMap::new();

        for event in events {
            let days_ago = (now - event.occurred_at).num_hours() as f64 / 24.0;
            if days_ago > self.config.lookback_days as f64 {
                continue;
            }
            let decayed = event.action.weight() * self.config.daily_decay_rate.powf(days_ago);
            *weights.entry(event.content_type).or_insert(0.0) += decayed;
        }

        weights.retain(|_, w| *w > 0.0);
        normalize_distribution(&mut weights);
        weights
    }

    fn build_activity(
        &self,
        pattern: &UserActivityPattern,
        now: DateTime<Utc>,
    ) -> (ActivityLevel, ActivityMetrics) {
        let weeks = (self.config.lookback_days as f64 / 7.0).max(1.0);
        let sessions_per_week = pattern.active_day_count as f64 / weeks;

        let monthly_opens = pattern.active_day_count;

        // Streak: consecutive days ending today with activity can only be
        // derived from the raw event stream; approximate with recency.
        let streak_days = match pattern.last_activity {
            Some(last) if (now - last).num_hours() < 24 => 1,
            _ => 0,
        };

        let metrics = ActivityMetrics {
            sessions_per_week,
            monthly_opens,
            streak_days,
            engagement_rate: pattern.engagement_rate(),
        };

        let level = if sessions_per_week < 0.5 {
            ActivityLevel::Inactive
        } else if sessions_per_week < 2.0 {
            ActivityLevel::Low
        } else if sessions_per_week < 4.0 {
            ActivityLevel::Moderate
        } else if sessions_per_week < 6.0 {
            ActivityLevel::Active
        } else {
            ActivityLevel::HighlyActive
        };

        (level, metrics)
    }

    fn build_temporal(&self, pattern: &UserActivityPattern) -> TemporalPreference {
        TemporalPreference {
            active_hours: pattern.ranked_hours(),
            active_weekdays: pattern.ranked_weekdays(),
            timezone: "UTC".to_string(),
        }
    }

    /// Social score in [0, 10]: breadth (distinct authors engaged) and
    /// depth (total engagements) blended.
    fn build_social(&self, events: &[EngagementEvent]) -> (SocialLevel, f64) {
        let interactions = author_interaction_counts(events);
        if interactions.is_empty() {
            return (SocialLevel::Isolated, 0.0);
        }

        let breadth = (interactions.len() as f64).min(10.0);
        let depth: u32 = interactions.values().sum();
        let depth_score = (depth as f64 / 5.0).min(10.0);
        let score = (breadth * 0.6 + depth_score * 0.4).clamp(0.0, 10.0);

        let level = if score < 1.0 {
            SocialLevel::Isolated
        } else if score < 3.0 {
            SocialLevel::Observer
        } else if score < 6.0 {
            SocialLevel::Participant
        } else if score < 8.5 {
            SocialLevel::Connector
        } else {
            SocialLevel::Leader
        };

        (level, score)
    }

    fn classify_value_tier(engagement_count: u32) -> ValueTier {
        if engagement_count >= 100 {
            ValueTier::Premium
        } else if engagement_count >= 10 {
            ValueTier::Engaged
        } else {
            ValueTier::Basic
        }
    }

    fn estimate_churn_risk(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        match last {
            Some(last) => {
                let days_idle = (now - last).num_hours() as f64 / 24.0;
                (days_idle / 30.0).clamp(0.0, 1.0)
            }
            None => NEUTRAL_SCORE,
        }
    }
}
