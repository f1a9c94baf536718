// Score combiner and weight-profile registry.
//
// Weight profiles are a closed set of named, validated constants loaded
// once at startup. Every profile's five weights sum to 1.0; validation
// happens at registry build time, never per request, so a malformed
// weight set can never reach the combiner. Selecting an unknown name
// falls back to "default" with a configuration warning.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

use crate::models::{ScoreBreakdown, ScoreComponent, SignalScores};

pub const DEFAULT_PROFILE: &str = "default";

const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Named, immutable set of five non-negative signal weights.
#[derive(Debug, Clone)]
pub struct WeightProfile {
    pub name: &'static str,
    pub content_affinity: f64,
    pub social_affinity: f64,
    pub past_engagement: f64,
    pub timing: f64,
    pub popularity: f64,
}

impl WeightProfile {
    const fn new(
        name: &'static str,
        content_affinity: f64,
        social_affinity: f64,
        past_engagement: f64,
        timing: f64,
        popularity: f64,
    ) -> Self {
        Self {
            name,
            content_affinity,
            social_affinity,
            past_engagement,
            timing,
            popularity,
        }
    }

    fn validate(&self) -> Result<(), String> {
        let weights = [
            self.content_affinity,
            self.social_affinity,
            self.past_engagement,
            self.timing,
            self.popularity,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(format!("weight profile '{}' has a negative weight", self.name));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(format!(
                "weight profile '{}' sums to {}, expected 1.0",
                self.name, sum
            ));
        }
        Ok(())
    }

    pub fn as_array(&self) -> [(&'static str, f64); 5] {
        [
            ("content_affinity", self.content_affinity),
            ("social_affinity", self.social_affinity),
            ("past_engagement", self.past_engagement),
            ("timing", self.timing),
            ("popularity", self.popularity),
        ]
    }
}

const PROFILES: &[WeightProfile] = &[
    WeightProfile::new(DEFAULT_PROFILE, 0.25, 0.25, 0.15, 0.15, 0.20),
    WeightProfile::new("social-first", 0.15, 0.40, 0.15, 0.10, 0.20),
    WeightProfile::new("content-first", 0.40, 0.15, 0.20, 0.10, 0.15),
    WeightProfile::new("trending", 0.15, 0.10, 0.10, 0.20, 0.45),
    WeightProfile::new("fresh", 0.15, 0.15, 0.10, 0.45, 0.15),
];

static REGISTRY: Lazy<HashMap<&'static str, WeightProfile>> = Lazy::new(|| {
    let mut registry = HashMap::new();
    for profile in PROFILES {
        profile
            .validate()
            .unwrap_or_else(|e| panic!("invalid built-in weight profile: {}", e));
        registry.insert(profile.name, profile.clone());
    }
    registry
});

/// Resolve a weight profile by name. Unknown names fall back to
/// "default" and log a configuration warning.
pub fn resolve(name: Option<&str>) -> &'static WeightProfile {
    match name {
        None => &REGISTRY[DEFAULT_PROFILE],
        Some(name) => match REGISTRY.get(name) {
            Some(profile) => profile,
            None => {
                warn!(
                    weight_profile = name,
                    "Unknown weight profile, falling back to default"
                );
                &REGISTRY[DEFAULT_PROFILE]
            }
        },
    }
}

pub fn profile_names() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

/// Weighted combination of the five signal scores into [0, 1].
pub fn combine(scores: &SignalScores, profile: &WeightProfile) -> f64 {
    let combined = scores.content_affinity * profile.content_affinity
        + scores.social_affinity * profile.social_affinity
        + scores.past_engagement * profile.past_engagement
        + scores.timing * profile.timing
        + scores.popularity * profile.popularity;
    combined.clamp(0.0, 1.0)
}

/// Explain variant: full per-signal breakdown. Opt-in only; normal
/// responses never carry this shape.
pub fn explain(scores: &SignalScores, profile: &WeightProfile) -> ScoreBreakdown {
    let components = scores
        .as_array()
        .iter()
        .zip(profile.as_array().iter())
        .map(|((signal, raw), (_, weight))| ScoreComponent {
            signal: signal.to_string(),
            raw: *raw,
            weight: *weight,
            contribution: raw * weight,
        })
        .collect();

    ScoreBreakdown {
        weight_profile: profile.name.to_string(),
        components,
        final_score: combine(scores, profile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> SignalScores {
        SignalScores {
            content_affinity: 1.0,
            social_affinity: 0.8,
            past_engagement: 0.5,
            timing: 0.4,
            popularity: 0.6,
        }
    }

    #[test]
    fn test_all_registry_profiles_sum_to_one() {
        for name in profile_names() {
            let profile = resolve(Some(name));
            let sum: f64 = profile.as_array().iter().map(|(_, w)| w).sum();
            assert!(
                (sum - 1.0).abs() < WEIGHT_SUM_EPSILON,
                "profile '{}' sums to {}",
                name,
                sum
            );
        }
    }

    #[test]
    fn test_default_weights() {
        let profile = resolve(None);
        assert_eq!(profile.name, DEFAULT_PROFILE);
        assert!((profile.content_affinity - 0.25).abs() < 1e-9);
        assert!((profile.popularity - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_name_matches_default_output() {
        let via_default = combine(&scores(), resolve(Some("default")));
        let via_unknown = combine(&scores(), resolve(Some("does-not-exist")));
        assert_eq!(via_default, via_unknown);
    }

    #[test]
    fn test_combine_bounded_and_weighted() {
        let profile = resolve(None);
        let combined = combine(&scores(), profile);
        assert!((0.0..=1.0).contains(&combined));

        let expected = 1.0 * 0.25 + 0.8 * 0.25 + 0.5 * 0.15 + 0.4 * 0.15 + 0.6 * 0.20;
        assert!((combined - expected).abs() < 1e-9);
    }

    #[test]
    fn test_explain_contributions_sum_to_final() {
        let profile = resolve(Some("trending"));
        let breakdown = explain(&scores(), profile);

        assert_eq!(breakdown.components.len(), 5);
        let total: f64 = breakdown.components.iter().map(|c| c.contribution).sum();
        assert!((total - breakdown.final_score).abs() < 1e-9);
        assert_eq!(breakdown.weight_profile, "trending");
    }

    #[test]
    fn test_explain_is_deterministic() {
        let profile = resolve(None);
        let a = explain(&scores(), profile);
        let b = explain(&scores(), profile);
        assert_eq!(a.final_score, b.final_score);
        for (x, y) in a.components.iter().zip(b.components.iter()) {
            assert_eq!(x.raw, y.raw);
            assert_eq!(x.contribution, y.contribution);
        }
    }
}
