use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub ranking: RankingConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_port: u16,
    pub service_name: String,
}

#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Candidate retention window; older items are excluded upstream,
    /// never scored.
    pub candidate_window_hours: i64,
    /// Superset size fetched from the content store per request.
    pub candidate_limit: usize,
    pub max_page_size: usize,
    /// Overall per-request scoring deadline. When exceeded, remaining
    /// candidates fall back to recency-only ordering.
    pub deadline_ms: u64,
    /// Window within which a previously shown item is excluded.
    pub seen_lookback_hours: i64,
    /// Trailing window for interaction history used by the social and
    /// past-engagement signals.
    pub interaction_window_days: i64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for tenant percentile baselines.
    pub baseline_ttl_secs: u64,
    /// TTL for per-user behavior patterns.
    pub pattern_ttl_secs: u64,
    /// TTL for computed user profiles.
    pub profile_ttl_secs: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            candidate_window_hours: 168, // 7 days
            candidate_limit: 500,
            max_page_size: 100,
            deadline_ms: 500,
            seen_lookback_hours: 24,
            interaction_window_days: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            baseline_ttl_secs: 900,  // 15 minutes
            pattern_ttl_secs: 1800,  // 30 minutes
            profile_ttl_secs: 3600,  // 1 hour
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            service: ServiceConfig {
                http_port: env::var("HTTP_PORT")
                    .unwrap_or_else(|_| "8013".to_string())
                    .parse()
                    .unwrap_or(8013),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "feed-ranking-engine".to_string()),
            },
            ranking: RankingConfig {
                candidate_window_hours: parse_env("CANDIDATE_WINDOW_HOURS", 168),
                candidate_limit: parse_env("CANDIDATE_LIMIT", 500),
                max_page_size: parse_env("MAX_PAGE_SIZE", 100),
                deadline_ms: parse_env("RANK_DEADLINE_MS", 500),
                seen_lookback_hours: parse_env("SEEN_LOOKBACK_HOURS", 24),
                interaction_window_days: parse_env("INTERACTION_WINDOW_DAYS", 30),
            },
            cache: CacheConfig {
                baseline_ttl_secs: parse_env("BASELINE_TTL_SECS", 900),
                pattern_ttl_secs: parse_env("PATTERN_TTL_SECS", 1800),
                profile_ttl_secs: parse_env("PROFILE_TTL_SECS", 3600),
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ranking = RankingConfig::default();
        assert_eq!(ranking.candidate_window_hours, 168);
        assert_eq!(ranking.seen_lookback_hours, 24);

        let cache = CacheConfig::default();
        assert_eq!(cache.baseline_ttl_secs, 900);
    }
}
