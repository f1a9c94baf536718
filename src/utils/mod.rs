// Utility functions shared by the scoring pipeline

/// Normalize a raw value against a reference ceiling into [0, 1].
///
/// A missing or zero ceiling means the baseline could not be computed;
/// callers treat that case as neutral before reaching this function.
pub fn normalize_capped(value: f64, ceiling: f64) -> f64 {
    if ceiling <= f64::EPSILON {
        0.5
    } else {
        (value / ceiling).clamp(0.0, 1.0)
    }
}

/// Exponential decay for time-based scoring.
///
/// Returns `e^(-lambda * age_hours)` where lambda is derived from the
/// half-life: after `half_life_hours` the score is exactly 0.5.
pub fn exponential_decay(age_hours: f64, half_life_hours: f64) -> f64 {
    if half_life_hours <= f64::EPSILON {
        return 0.0;
    }
    let lambda = std::f64::consts::LN_2 / half_life_hours;
    (-lambda * age_hours.max(0.0)).exp()
}

/// Normalize a weight map so the weights sum to 1.0.
///
/// Empty or all-zero input is returned unchanged; callers treat an empty
/// distribution as "no data".
pub fn normalize_distribution<K: std::hash::Hash + Eq>(
    dist: &mut std::collections::HashMap<K, f64>,
) {
    let total: f64 = dist.values().sum();
    if total > f64::EPSILON {
        for weight in dist.values_mut() {
            *weight /= total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_normalize_capped() {
        assert!((normalize_capped(5.0, 10.0) - 0.5).abs() < 1e-9);
        assert!((normalize_capped(15.0, 10.0) - 1.0).abs() < 1e-9);
        // Missing ceiling falls back to neutral
        assert!((normalize_capped(5.0, 0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_decay_half_life() {
        let score = exponential_decay(6.0, 6.0);
        assert!((score - 0.5).abs() < 0.001);

        let fresh = exponential_decay(0.0, 6.0);
        assert!((fresh - 1.0).abs() < 0.001);

        // Newer content always scores higher
        assert!(exponential_decay(1.0, 6.0) > exponential_decay(24.0, 6.0));
    }

    #[test]
    fn test_normalize_distribution() {
        let mut dist: HashMap<String, f64> =
            [("strength".to_string(), 3.0), ("yoga".to_string(), 1.0)]
                .into_iter()
                .collect();
        normalize_distribution(&mut dist);

        let total: f64 = dist.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((dist["strength"] - 0.75).abs() < 1e-9);
    }
}
