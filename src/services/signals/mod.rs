// Signal calculators.
//
// Five independent, pure functions of (profile, candidate, aggregates),
// each returning a score in [0, 1]. Missing inputs degrade to a
// documented neutral default, never an error; the calculators read only
// immutable snapshots and are safe to run in parallel per candidate.

pub mod content_affinity;
pub mod past_engagement;
pub mod popularity;
pub mod social_affinity;
pub mod timing;

pub use content_affinity::content_affinity;
pub use past_engagement::past_engagement;
pub use popularity::popularity;
pub use social_affinity::social_affinity;
pub use timing::timing;

use chrono::{DateTime, Utc};

use crate::models::{CandidateItem, SignalScores};
use crate::services::aggregate_cache::AggregateBaseline;
use crate::services::profile::UserProfile;

/// Neutral score used by every calculator when its inputs are missing.
pub const NEUTRAL: f64 = 0.5;

/// Run all five calculators against one candidate.
pub fn compute_all(
    profile: &UserProfile,
    candidate: &CandidateItem,
    baseline: Option<&AggregateBaseline>,
    now: DateTime<Utc>,
) -> SignalScores {
    SignalScores {
        content_affinity: content_affinity(profile, candidate),
        social_affinity: social_affinity(profile, candidate),
        past_engagement: past_engagement(profile, candidate),
        timing: timing(profile, candidate, now),
        popularity: popularity(candidate, baseline, now),
    }
}
