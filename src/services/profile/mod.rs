// User profile subsystem.
//
// A profile is a versioned, strongly-typed record per (user, tenant),
// assembled by a builder pipeline with one pure builder per dimension
// and replaced atomically as a whole record. Partial mutation is never
// performed; concurrent readers always see a consistent profile.

pub mod builders;
pub mod store;

pub use builders::{ProfileBuilder, ProfileBuilderConfig};
pub use store::{ProfileStore, RecomputeStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ContentType;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile data source error: {0}")]
    DataSource(String),

    #[error("Invalid profile data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;

/// Neutral mid-range score used wherever a dimension has no data.
pub const NEUTRAL_SCORE: f64 = 0.5;

const DISTRIBUTION_EPSILON: f64 = 1e-6;

/// Ordered activity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Inactive,
    Low,
    Moderate,
    Active,
    HighlyActive,
}

/// Ordered social engagement classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialLevel {
    Isolated,
    Observer,
    Participant,
    Connector,
    Leader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTier {
    Basic,
    Engaged,
    Premium,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityMetrics {
    pub sessions_per_week: f64,
    pub monthly_opens: u32,
    pub streak_days: u32,
    /// Engagements per view over the trailing window.
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalPreference {
    /// Hours ranked by activity, most active first (UTC).
    pub active_hours: Vec<u8>,
    /// Weekdays ranked by activity, 0 = Sunday.
    pub active_weekdays: Vec<u8>,
    pub timezone: String,
}

impl Default for TemporalPreference {
    fn default() -> Self {
        Self {
            active_hours: Vec::new(),
            active_weekdays: Vec::new(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub primary: String,
    /// Progress toward the goal in [0, 1].
    pub progress: f64,
}

/// Complete profile for one (user, tenant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub primary_interest: Option<String>,
    /// Category -> weight; sums to 1.0 when non-empty.
    pub interest_distribution: HashMap<String, f64>,
    pub activity_level: ActivityLevel,
    pub activity_metrics: ActivityMetrics,
    pub temporal: TemporalPreference,
    pub goal: Option<Goal>,
    pub social_level: SocialLevel,
    /// Social engagement score in [0, 10].
    pub social_score: f64,
    /// Users who coach this user.
    pub coaches: Vec<Uuid>,
    /// Users this user coaches.
    pub coachees: Vec<Uuid>,
    /// Engagement interactions per author over the trailing window.
    pub author_interactions: HashMap<Uuid, u32>,
    /// Content type -> weight; sums to 1.0 when non-empty.
    pub content_type_distribution: HashMap<ContentType, f64>,
    pub value_tier: ValueTier,
    /// Churn risk estimate in [0, 1].
    pub churn_risk: f64,
    pub location: Option<String>,
    pub version: u32,
    pub computed_at: DateTime<Utc>,
}

impl UserProfile {
    /// Minimal default profile: every dimension neutral. Used when the
    /// underlying data sources are unavailable or empty, so a ranking
    /// request never fails on a missing profile.
    pub fn neutral_default(user_id: Uuid, tenant_id: Uuid) -> Self {
        Self {
            user_id,
            tenant_id,
            primary_interest: None,
            interest_distribution: HashMap::new(),
            activity_level: ActivityLevel::Moderate,
            activity_metrics: ActivityMetrics::default(),
            temporal: TemporalPreference::default(),
            goal: None,
            social_level: SocialLevel::Observer,
            social_score: 5.0,
            coaches: Vec::new(),
            coachees: Vec::new(),
            author_interactions: HashMap::new(),
            content_type_distribution: HashMap::new(),
            value_tier: ValueTier::Basic,
            churn_risk: NEUTRAL_SCORE,
            location: None,
            version: 0,
            computed_at: Utc::now(),
        }
    }

    pub fn has_interest_data(&self) -> bool {
        !self.interest_distribution.is_empty()
    }

    /// Validate record invariants: distributions sum to 1.0 ± epsilon
    /// and bounded scores lie in their declared ranges.
    pub fn validate(&self) -> Result<()> {
        for (name, dist_sum) in [
            (
                "interest_distribution",
                sum_if_nonempty(self.interest_distribution.values()),
            ),
            (
                "content_type_distribution",
                sum_if_nonempty(self.content_type_distribution.values()),
            ),
        ] {
            if let Some(sum) = dist_sum {
                if (sum - 1.0).abs() > DISTRIBUTION_EPSILON {
                    return Err(ProfileError::InvalidData(format!(
                        "{} sums to {}, expected 1.0",
                        name, sum
                    )));
                }
            }
        }

        if !(0.0..=10.0).contains(&self.social_score) {
            return Err(ProfileError::InvalidData(format!(
                "social_score {} out of [0, 10]",
                self.social_score
            )));
        }
        if !(0.0..=1.0).contains(&self.churn_risk) {
            return Err(ProfileError::InvalidData(format!(
                "churn_risk {} out of [0, 1]",
                self.churn_risk
            )));
        }
        if let Some(goal) = &self.goal {
            if !(0.0..=1.0).contains(&goal.progress) {
                return Err(ProfileError::InvalidData(format!(
                    "goal progress {} out of [0, 1]",
                    goal.progress
                )));
            }
        }
        Ok(())
    }
}

fn sum_if_nonempty<'a>(values: impl Iterator<Item = &'a f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut any = false;
    for v in values {
        sum += v;
        any = true;
    }
    any.then_some(sum)
}
