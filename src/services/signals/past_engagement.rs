// Past engagement: propensity to engage, estimated from the user's
// historical interaction rate with content of the same type and
// category over the trailing window.
//
//   score = 0.4 * type_match + 0.4 * category_match + 0.2 * frequency_bonus
//
// capped at 1.0. No history at all degrades to 0.5 neutral.

use crate::models::CandidateItem;
use crate::services::profile::UserProfile;

use super::NEUTRAL;

const TYPE_WEIGHT: f64 = 0.4;
const CATEGORY_WEIGHT: f64 = 0.4;
const FREQUENCY_WEIGHT: f64 = 0.2;

/// Engagement rate treated as "generally high" for the frequency bonus.
const HIGH_ENGAGEMENT_RATE: f64 = 0.2;

pub fn past_engagement(profile: &UserProfile, candidate: &CandidateItem) -> f64 {
    let has_type_history = !profile.content_type_distribution.is_empty();
    let has_category_history = !profile.interest_distribution.is_empty();
    if !has_type_history && !has_category_history {
        return NEUTRAL;
    }

    let type_match = if has_type_history {
        relative_weight(
            profile
                .content_type_distribution
                .get(&candidate.content_type)
                .copied(),
            profile.content_type_distribution.values(),
        )
    } else {
        NEUTRAL
    };

    let category_match = if has_category_history && !candidate.tags.is_empty() {
        candidate
            .tags
            .iter()
            .map(|tag| {
                relative_weight(
                    profile.interest_distribution.get(tag).copied(),
                    profile.interest_distribution.values(),
                )
            })
            .fold(0.0, f64::max)
    } else {
        NEUTRAL
    };

    let frequency_bonus =
        (profile.activity_metrics.engagement_rate / HIGH_ENGAGEMENT_RATE).clamp(0.0, 1.0);

    (TYPE_WEIGHT * type_match + CATEGORY_WEIGHT * category_match + FREQUENCY_WEIGHT * frequency_bonus)
        .min(1.0)
}

/// Weight relative to the strongest preference in the distribution.
fn relative_weight<'a>(weight: Option<f64>, all: impl Iterator<Item = &'a f64>) -> f64 {
    let max = all.cloned().fold(0.0, f64::max);
    if max <= f64::EPSILON {
        return NEUTRAL;
    }
    (weight.unwrap_or(0.0) / max).clamp(0.0, 1.0)
}
