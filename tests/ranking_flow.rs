// End-to-end ranking flow against the in-memory collaborators.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::mock;
use std::sync::Arc;
use uuid::Uuid;

use feed_ranking_engine::config::{CacheConfig, RankingConfig};
use feed_ranking_engine::models::{
    CandidateItem, ContentType, EngagementAction, EngagementEvent, ItemEngagement, RankRequest,
    Visibility,
};
use feed_ranking_engine::services::aggregate_cache::AggregateCache;
use feed_ranking_engine::services::collaborators::{
    CoachLinks, CollaboratorError, EngagementSource, InMemoryContentStore,
    InMemoryEngagementSource, InMemoryTenantConfig,
};
use feed_ranking_engine::services::orchestrator::RankingOrchestrator;
use feed_ranking_engine::services::profile::ProfileStore;
use feed_ranking_engine::services::view_ledger::ViewLedger;

mock! {
    Engagement {}

    #[async_trait]
    impl EngagementSource for Engagement {
        async fn fetch_user_events(
            &self,
            user_id: Uuid,
            tenant_id: Uuid,
            lookback: Duration,
        ) -> Result<Vec<EngagementEvent>, CollaboratorError>;

        async fn fetch_tenant_engagement(
            &self,
            tenant_id: Uuid,
            window: Duration,
        ) -> Result<Vec<ItemEngagement>, CollaboratorError>;

        async fn active_users(&self, tenant_id: Uuid) -> Result<Vec<Uuid>, CollaboratorError>;
    }
}

struct Env {
    content: Arc<InMemoryContentStore>,
    engagement: Arc<InMemoryEngagementSource>,
    tenant_config: Arc<InMemoryTenantConfig>,
    orchestrator: RankingOrchestrator,
    tenant: Uuid,
    user: Uuid,
}

fn build_env() -> Env {
    let content = Arc::new(InMemoryContentStore::new());
    let engagement = Arc::new(InMemoryEngagementSource::new());
    let tenant_config = Arc::new(InMemoryTenantConfig::new());
    let cache_config = CacheConfig::default();
    let aggregates = Arc::new(AggregateCache::new(engagement.clone(), &cache_config));
    let profiles = Arc::new(ProfileStore::new(
        engagement.clone(),
        tenant_config.clone(),
        aggregates.clone(),
        &cache_config,
    ));
    let ledger = Arc::new(ViewLedger::new(48));

    let orchestrator = RankingOrchestrator::new(
        content.clone(),
        tenant_config.clone(),
        profiles,
        aggregates,
        ledger,
        RankingConfig::default(),
    );

    Env {
        content,
        engagement,
        tenant_config,
        orchestrator,
        tenant: Uuid::new_v4(),
        user: Uuid::new_v4(),
    }
}

fn item(tenant: Uuid, author: Uuid, tags: &[&str], age_hours: i64) -> CandidateItem {
    CandidateItem {
        id: Uuid::new_v4(),
        author_id: author,
        tenant_id: tenant,
        content_type: ContentType::Post,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: Utc::now() - Duration::hours(age_hours),
        like_count: 2,
        comment_count: 1,
        view_count: 40,
        visibility: Visibility::Public,
        location: None,
    }
}

fn engagement_event(
    user: Uuid,
    author: Uuid,
    tenant: Uuid,
    action: EngagementAction,
    tag: &str,
    days_ago: i64,
) -> EngagementEvent {
    EngagementEvent {
        user_id: user,
        item_id: Uuid::new_v4(),
        author_id: author,
        tenant_id: tenant,
        action,
        content_type: ContentType::Post,
        tags: vec![tag.to_string()],
        occurred_at: Utc::now() - Duration::days(days_ago),
    }
}

fn request(user: Uuid, tenant: Uuid) -> RankRequest {
    RankRequest {
        user_id: user,
        tenant_id: tenant,
        page_size: 20,
        offset: 0,
        weight_profile: None,
        exclude_seen: true,
        explain: false,
    }
}

#[tokio::test]
async fn personalized_ranking_prefers_coach_and_interest_matches() {
    let env = build_env();
    let coach = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    env.tenant_config.set_coach_links(
        env.user,
        env.tenant,
        CoachLinks {
            coaches: vec![coach],
            coachees: vec![],
        },
    );

    // History: the user engages with strength content
    for day in 0..5 {
        env.engagement.record_event(engagement_event(
            env.user,
            stranger,
            env.tenant,
            EngagementAction::Like,
            "strength",
            day,
        ));
    }

    let coach_post = item(env.tenant, coach, &["mobility"], 4);
    let interest_post = item(env.tenant, stranger, &["strength"], 4);
    let unrelated_post = item(env.tenant, Uuid::new_v4(), &["nutrition"], 4);
    let coach_id = coach_post.id;
    let unrelated_id = unrelated_post.id;
    env.content.insert(coach_post);
    env.content.insert(interest_post);
    env.content.insert(unrelated_post);

    let response = env
        .orchestrator
        .rank(&request(env.user, env.tenant))
        .await
        .unwrap();

    assert_eq!(response.items.len(), 3);
    assert!(!response.degraded);

    // The coach's post outranks a stranger's unrelated post
    let pos = |id: Uuid| response.items.iter().position(|i| i.candidate_id == id);
    assert!(pos(coach_id).unwrap() < pos(unrelated_id).unwrap());

    for ranked in &response.items {
        assert!((0.0..=1.0).contains(&ranked.score));
    }
}

#[tokio::test]
async fn seen_items_drop_out_of_subsequent_pages() {
    let env = build_env();
    let author = Uuid::new_v4();
    for age in 1..=5 {
        env.content.insert(item(env.tenant, author, &[], age));
    }

    let first = env
        .orchestrator
        .rank(&request(env.user, env.tenant))
        .await
        .unwrap();
    assert_eq!(first.items.len(), 5);

    // The view-ledger write is asynchronous; let it settle
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let second = env
        .orchestrator
        .rank(&request(env.user, env.tenant))
        .await
        .unwrap();
    assert!(second.items.is_empty());
    assert!(!second.has_more);
}

#[tokio::test]
async fn tenant_weight_profile_is_applied() {
    let env = build_env();
    env.tenant_config.set_weight_profile(env.tenant, "trending");

    let author = Uuid::new_v4();
    let mut hot = item(env.tenant, author, &[], 2);
    hot.like_count = 80;
    hot.comment_count = 20;
    hot.view_count = 500;
    let mut cold = item(env.tenant, author, &[], 2);
    cold.like_count = 0;
    cold.comment_count = 0;
    let hot_id = hot.id;

    // Baseline summaries so the popularity percentiles exist
    for engagement_total in [1, 2, 3, 5, 8, 10, 15, 20, 30, 40] {
        env.engagement.record_item_engagement(
            env.tenant,
            ItemEngagement {
                item_id: Uuid::new_v4(),
                created_at: Utc::now() - Duration::hours(10),
                engagement_total,
                view_count: engagement_total * 10,
            },
        );
    }

    env.content.insert(hot);
    env.content.insert(cold);

    let response = env
        .orchestrator
        .rank(&request(env.user, env.tenant))
        .await
        .unwrap();

    assert_eq!(response.items[0].candidate_id, hot_id);
    assert!(response.items[0].score > response.items[1].score);
}

#[tokio::test]
async fn explain_mode_breakdown_matches_score() {
    let env = build_env();
    env.content
        .insert(item(env.tenant, Uuid::new_v4(), &["strength"], 3));

    let mut req = request(env.user, env.tenant);
    req.explain = true;

    let response = env.orchestrator.rank(&req).await.unwrap();
    let ranked = &response.items[0];
    let breakdown = ranked.breakdown.as_ref().expect("explain requested");

    assert_eq!(breakdown.components.len(), 5);
    let contribution_sum: f64 = breakdown.components.iter().map(|c| c.contribution).sum();
    assert!((contribution_sum - ranked.score).abs() < 1e-9);
    assert_eq!(breakdown.weight_profile, "default");
}

#[tokio::test]
async fn engagement_outage_degrades_to_neutral_profile() {
    let mut mock_engagement = MockEngagement::new();
    mock_engagement
        .expect_fetch_user_events()
        .returning(|_, _, _| Err(CollaboratorError::Unavailable("events down".into())));
    mock_engagement
        .expect_fetch_tenant_engagement()
        .returning(|_, _| Err(CollaboratorError::Unavailable("events down".into())));
    mock_engagement
        .expect_active_users()
        .returning(|_| Err(CollaboratorError::Unavailable("events down".into())));

    let engagement: Arc<dyn EngagementSource> = Arc::new(mock_engagement);
    let content = Arc::new(InMemoryContentStore::new());
    let tenant_config = Arc::new(InMemoryTenantConfig::new());
    let cache_config = CacheConfig::default();
    let aggregates = Arc::new(AggregateCache::new(engagement.clone(), &cache_config));
    let profiles = Arc::new(ProfileStore::new(
        engagement,
        tenant_config.clone(),
        aggregates.clone(),
        &cache_config,
    ));

    let orchestrator = RankingOrchestrator::new(
        content.clone(),
        tenant_config,
        profiles,
        aggregates,
        Arc::new(ViewLedger::new(48)),
        RankingConfig::default(),
    );

    let tenant = Uuid::new_v4();
    let user = Uuid::new_v4();
    content.insert(item(tenant, Uuid::new_v4(), &["yoga"], 1));
    content.insert(item(tenant, Uuid::new_v4(), &["yoga"], 12));

    // The request still succeeds; scoring runs on a neutral profile
    let response = orchestrator.rank(&request(user, tenant)).await.unwrap();
    assert_eq!(response.items.len(), 2);
    assert!(response.items[0].score >= response.items[1].score);
}

#[tokio::test]
async fn ranking_is_deterministic_for_a_fixed_snapshot() {
    let env = build_env();
    let author = Uuid::new_v4();
    for (age, tag) in [(1, "strength"), (5, "yoga"), (9, "cardio"), (20, "hiit")] {
        env.content.insert(item(env.tenant, author, &[tag], age));
    }

    let mut req = request(env.user, env.tenant);
    req.exclude_seen = false;

    let first = env.orchestrator.rank(&req).await.unwrap();
    let second = env.orchestrator.rank(&req).await.unwrap();

    let ids = |r: &feed_ranking_engine::models::RankResponse| {
        r.items.iter().map(|i| i.candidate_id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}
