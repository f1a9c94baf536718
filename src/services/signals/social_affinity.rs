// Social affinity: tiered by the strongest applicable relationship
// between the requester and the candidate's author. Highest tier wins.
//
//   1.0  author is a designated coach of the requester
//   0.8  requester coaches the author
//   0.7  >= 5 engagement interactions in the trailing window
//   0.5  1-4 interactions
//   0.3  shared tenant, no interaction
//   0.1  no relationship
//   0.0  requester == author (own content is never ranked socially)

use crate::models::CandidateItem;
use crate::services::profile::UserProfile;

const STRONG_INTERACTION_THRESHOLD: u32 = 5;

pub fn social_affinity(profile: &UserProfile, candidate: &CandidateItem) -> f64 {
    let author = candidate.author_id;

    if author == profile.user_id {
        return 0.0;
    }
    if profile.coaches.contains(&author) {
        return 1.0;
    }
    if profile.coachees.contains(&author) {
        return 0.8;
    }

    match profile.author_interactions.get(&author).copied() {
        Some(n) if n >= STRONG_INTERACTION_THRESHOLD => 0.7,
        Some(n) if n >= 1 => 0.5,
        _ => {
            if candidate.tenant_id == profile.tenant_id {
                0.3
            } else {
                0.1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::test_support::{candidate, profile_with_interests};
    use uuid::Uuid;

    #[test]
    fn test_coach_outranks_interaction_history() {
        let tenant = Uuid::new_v4();
        let mut profile = profile_with_interests(tenant, &[]);
        let coach = Uuid::new_v4();
        profile.coaches.push(coach);
        // No interaction history at all: the relationship alone decides
        let mut item = candidate(tenant, &[], 1);
        item.author_id = coach;

        assert!((social_affinity(&profile, &item) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_coachee_tier() {
        let tenant = Uuid::new_v4();
        let mut profile = profile_with_interests(tenant, &[]);
        let coachee = Uuid::new_v4();
        profile.coachees.push(coachee);
        let mut item = candidate(tenant, &[], 1);
        item.author_id = coachee;

        assert!((social_affinity(&profile, &item) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_interaction_tiers() {
        let tenant = Uuid::new_v4();
        let mut profile = profile_with_interests(tenant, &[]);
        let frequent = Uuid::new_v4();
        let occasional = Uuid::new_v4();
        profile.author_interactions.insert(frequent, 7);
        profile.author_interactions.insert(occasional, 2);

        let mut item = candidate(tenant, &[], 1);
        item.author_id = frequent;
        assert!((social_affinity(&profile, &item) - 0.7).abs() < 1e-9);

        item.author_id = occasional;
        assert!((social_affinity(&profile, &item) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_shared_tenant_and_stranger() {
        let tenant = Uuid::new_v4();
        let profile = profile_with_interests(tenant, &[]);

        let same_tenant = candidate(tenant, &[], 1);
        assert!((social_affinity(&profile, &same_tenant) - 0.3).abs() < 1e-9);

        let foreign = candidate(Uuid::new_v4(), &[], 1);
        assert!((social_affinity(&profile, &foreign) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_own_content_scores_zero() {
        let tenant = Uuid::new_v4();
        let profile = profile_with_interests(tenant, &[]);
        let mut item = candidate(tenant, &[], 1);
        item.author_id = profile.user_id;

        assert_eq!(social_affinity(&profile, &item), 0.0);
    }
}
