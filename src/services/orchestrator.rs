// Ranking orchestrator.
//
// Stateless request path: fetch a candidate superset, drop already-seen
// items, snapshot the profile and tenant baseline once, score every
// candidate with the five pure calculators, combine, sort, paginate,
// then record view events as a fire-and-forget side effect.
//
// The per-request deadline is honored by falling back to recency-only
// ordering for candidates that were not scored in time; the response is
// flagged degraded instead of failing.

use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RankingConfig;
use crate::error::{AppError, Result};
use crate::models::{CandidateItem, RankRequest, RankResponse, RankedItem, ScoreBreakdown};
use crate::services::aggregate_cache::AggregateCache;
use crate::services::collaborators::{ContentStore, TenantConfigStore};
use crate::services::profile::ProfileStore;
use crate::services::scoring::{self, WeightProfile};
use crate::services::signals;
use crate::services::view_ledger::ViewLedger;
use crate::utils::exponential_decay;

/// Half-life used when a deadline forces recency-only scoring.
const FALLBACK_HALF_LIFE_HOURS: f64 = 6.0;

pub struct RankingOrchestrator {
    content: Arc<dyn ContentStore>,
    tenant_config: Arc<dyn TenantConfigStore>,
    profiles: Arc<ProfileStore>,
    aggregates: Arc<AggregateCache>,
    ledger: Arc<ViewLedger>,
    config: RankingConfig,
}

impl RankingOrchestrator {
    pub fn new(
        content: Arc<dyn ContentStore>,
        tenant_config: Arc<dyn TenantConfigStore>,
        profiles: Arc<ProfileStore>,
        aggregates: Arc<AggregateCache>,
        ledger: Arc<ViewLedger>,
        config: RankingConfig,
    ) -> Self {
        Self {
            content,
            tenant_config,
            profiles,
            aggregates,
            ledger,
            config,
        }
    }

    pub async fn rank(&self, request: &RankRequest) -> Result<RankResponse> {
        let page_size = request.page_size.clamp(1, self.config.max_page_size);
        let deadline = Instant::now() + Duration::from_millis(self.config.deadline_ms);

        // 1. Candidate superset; ranking cannot proceed without it
        let mut candidates = self
            .content
            .fetch_candidates(
                request.tenant_id,
                request.user_id,
                ChronoDuration::hours(self.config.candidate_window_hours),
                self.config.candidate_limit,
            )
            .await
            .map_err(|e| AppError::CandidateFetch(e.to_string()))?;

        // 2. Exclude already-seen items
        if request.exclude_seen {
            let seen = self.ledger.seen_set(
                request.user_id,
                request.tenant_id,
                ChronoDuration::hours(self.config.seen_lookback_hours),
            );
            if !seen.is_empty() {
                candidates.retain(|c| !seen.contains(&c.id));
            }
        }

        if candidates.is_empty() {
            debug!(user_id = %request.user_id, "No candidates after filtering");
            return Ok(RankResponse {
                items: vec![],
                has_more: false,
                degraded: false,
            });
        }

        // 3. Read-only snapshots, fetched once per request
        let (profile, baseline, weights) = futures::join!(
            self.profiles.get_profile(request.user_id, request.tenant_id),
            self.aggregates.baseline(request.tenant_id),
            self.resolve_weights(request.weight_profile.as_deref(), request.tenant_id),
        );

        // 4+5. Score candidates. The calculators are pure against the
        // snapshots, so candidates are independent and could fan out;
        // scoring is sequential CPU work here, which keeps the deadline
        // check deterministic between candidates.
        let now = chrono::Utc::now();
        let mut scored: Vec<(CandidateItem, f64, Option<ScoreBreakdown>)> = Vec::new();
        let mut unscored: Vec<CandidateItem> = Vec::new();
        let mut degraded = false;

        for (idx, candidate) in candidates.iter().enumerate() {
            if Instant::now() >= deadline {
                degraded = true;
                unscored.extend(candidates[idx..].iter().cloned());
                warn!(
                    user_id = %request.user_id,
                    scored = idx,
                    remaining = candidates.len() - idx,
                    "Scoring deadline exceeded, falling back to recency ordering"
                );
                break;
            }

            let scores = signals::compute_all(&profile, candidate, baseline.as_ref(), now);
            let final_score = scoring::combine(&scores, weights);
            let breakdown = request
                .explain
                .then(|| scoring::explain(&scores, weights));
            scored.push((candidate.clone(), final_score, breakdown));
        }

        // 6. Stable sort, descending score, newest first on ties
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.0.created_at.cmp(&a.0.created_at))
        });

        // Unscored remainder ordered by recency only, after all scored
        unscored.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let fallback = unscored.into_iter().map(|c| {
            let score = exponential_decay(c.age_hours(now), FALLBACK_HALF_LIFE_HOURS);
            (c, score, None)
        });

        let ordered: Vec<(CandidateItem, f64, Option<ScoreBreakdown>)> =
            scored.into_iter().chain(fallback).collect();

        // 7. Paginate
        let total = ordered.len();
        let start = request.offset.min(total);
        let end = (start + page_size).min(total);
        let has_more = end < total;

        let page: Vec<RankedItem> = ordered[start..end]
            .iter()
            .map(|(candidate, score, breakdown)| RankedItem {
                candidate_id: candidate.id,
                score: *score,
                breakdown: breakdown.clone(),
            })
            .collect();

        // 8. Async view-ledger write; never blocks or fails the response
        if !page.is_empty() {
            let ledger = Arc::clone(&self.ledger);
            let user_id = request.user_id;
            let tenant_id = request.tenant_id;
            let item_ids: Vec<Uuid> = page.iter().map(|item| item.candidate_id).collect();
            tokio::spawn(async move {
                ledger.record_views(user_id, tenant_id, &item_ids);
            });
        }

        info!(
            user_id = %request.user_id,
            tenant_id = %request.tenant_id,
            returned = page.len(),
            total_candidates = total,
            weight_profile = weights.name,
            degraded,
            "Ranked feed page served"
        );

        Ok(RankResponse {
            items: page,
            has_more,
            degraded,
        })
    }

    /// Diagnostic: full breakdown for a single (user, candidate) pair.
    pub async fn explain_one(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<ScoreBreakdown> {
        let candidate = self
            .content
            .fetch_item(tenant_id, candidate_id)
            .await
            .map_err(|e| AppError::CandidateFetch(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("candidate {}", candidate_id)))?;

        let profile = self.profiles.get_profile(user_id, tenant_id).await;
        let baseline = self.aggregates.baseline(tenant_id).await;
        let weights = self.resolve_weights(None, tenant_id).await;

        let scores = signals::compute_all(&profile, &candidate, baseline.as_ref(), chrono::Utc::now());
        Ok(scoring::explain(&scores, weights))
    }

    /// Request override wins over tenant configuration; both fall back
    /// to "default".
    async fn resolve_weights(
        &self,
        requested: Option<&str>,
        tenant_id: Uuid,
    ) -> &'static WeightProfile {
        if requested.is_some() {
            return scoring::resolve(requested);
        }
        match self.tenant_config.weight_profile_name(tenant_id).await {
            Ok(name) => scoring::resolve(name.as_deref()),
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "Tenant config unavailable");
                scoring::resolve(None)
            }
        }
    }
}
