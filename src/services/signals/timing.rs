// Timing: recency decay blended with a match against the user's most
// active hours.
//
//   score = 0.7 * e^(-lambda * age_hours) + 0.3 * active_hour_bonus
//
// lambda gives a 6-hour half-life. The bonus is 1.0 when the candidate
// was created in the user's top-2 most active hours, 0.5 in the top-5,
// and neutral otherwise (including when there is no temporal data).
// Candidates past the retention window are excluded upstream and never
// reach this calculator.

use chrono::{DateTime, Utc};

use crate::models::CandidateItem;
use crate::services::profile::UserProfile;
use crate::utils::exponential_decay;

use super::NEUTRAL;

const RECENCY_WEIGHT: f64 = 0.7;
const ACTIVE_HOUR_WEIGHT: f64 = 0.3;
const HALF_LIFE_HOURS: f64 = 6.0;

pub fn timing(profile: &UserProfile, candidate: &CandidateItem, now: DateTime<Utc>) -> f64 {
    let recency = exponential_decay(candidate.age_hours(now), HALF_LIFE_HOURS);
    let bonus = active_hour_bonus(profile, candidate.created_hour());

    (RECENCY_WEIGHT * recency + ACTIVE_HOUR_WEIGHT * bonus).clamp(0.0, 1.0)
}

fn active_hour_bonus(profile: &UserProfile, hour: u8) -> f64 {
    let hours = &profile.temporal.active_hours;
    if hours.is_empty() {
        return NEUTRAL;
    }
    if hours.iter().take(2).any(|&h| h == hour) {
        return 1.0;
    }
    if hours.iter().take(5).any(|&h| h == hour) {
        return 0.5;
    }
    NEUTRAL
}
