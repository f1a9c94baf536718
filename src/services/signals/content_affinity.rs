// Content affinity: tiered category match between the candidate's tags
// and the profile's interest distribution.
//
// Tiers:
//   1.0  candidate carries the profile's top category
//   0.7  candidate tag present with interest weight >= 0.2
//   0.5  no data on either side
//   0.2  no match (non-zero floor preserves content diversity)
//
// Location and structured-content-type matches are blended as weighted
// sub-terms inside this one signal; a sub-term with no data is skipped
// so the tier value passes through unchanged.

use crate::models::CandidateItem;
use crate::services::profile::UserProfile;

use super::NEUTRAL;

/// Minimum interest weight for the secondary-category tier.
const SECONDARY_WEIGHT_THRESHOLD: f64 = 0.2;

const TIER_WEIGHT: f64 = 0.8;
const LOCATION_WEIGHT: f64 = 0.1;
const CONTENT_TYPE_WEIGHT: f64 = 0.1;

pub fn content_affinity(profile: &UserProfile, candidate: &CandidateItem) -> f64 {
    let tier = category_tier(profile, candidate);

    // Weighted blend over the sub-terms that have data, renormalized so
    // absent sub-terms leave the tier untouched.
    let mut weighted_sum = tier * TIER_WEIGHT;
    let mut weight_total = TIER_WEIGHT;

    if let (Some(profile_loc), Some(item_loc)) = (&profile.location, &candidate.location) {
        let term = if profile_loc.eq_ignore_ascii_case(item_loc) {
            1.0
        } else {
            0.0
        };
        weighted_sum += term * LOCATION_WEIGHT;
        weight_total += LOCATION_WEIGHT;
    }

    if !profile.content_type_distribution.is_empty() {
        weighted_sum += content_type_term(profile, candidate) * CONTENT_TYPE_WEIGHT;
        weight_total += CONTENT_TYPE_WEIGHT;
    }

    (weighted_sum / weight_total).clamp(0.0, 1.0)
}

fn category_tier(profile: &UserProfile, candidate: &CandidateItem) -> f64 {
    if profile.interest_distribution.is_empty() || candidate.tags.is_empty() {
        return NEUTRAL;
    }

    if let Some(primary) = &profile.primary_interest {
        if candidate.tags.iter().any(|t| t == primary) {
            return 1.0;
        }
    }

    let secondary_match = candidate.tags.iter().any(|tag| {
        profile
            .interest_distribution
            .get(tag)
            .is_some_and(|w| *w >= SECONDARY_WEIGHT_THRESHOLD)
    });
    if secondary_match {
        return 0.7;
    }

    0.2
}

/// Candidate content type's interest weight relative to the strongest
/// type preference.
fn content_type_term(profile: &UserProfile, candidate: &CandidateItem) -> f64 {
    let max_weight = profile
        .content_type_distribution
        .values()
        .cloned()
        .fold(0.0, f64::max);
    if max_weight <= f64::EPSILON {
        return NEUTRAL;
    }
    profile
        .content_type_distribution
        .get(&candidate.content_type)
        .map(|w| (w / max_weight).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}
