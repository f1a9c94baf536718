use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_ranking_engine::handlers::{self, AppState};
use feed_ranking_engine::jobs::{ProfileBatchConfig, ProfileBatchJob};
use feed_ranking_engine::services::aggregate_cache::AggregateCache;
use feed_ranking_engine::services::collaborators::{
    InMemoryContentStore, InMemoryEngagementSource, InMemoryTenantConfig,
};
use feed_ranking_engine::services::orchestrator::RankingOrchestrator;
use feed_ranking_engine::services::profile::ProfileStore;
use feed_ranking_engine::services::view_ledger::ViewLedger;
use feed_ranking_engine::Config;

/// How often expired view records are pruned.
const LEDGER_PRUNE_INTERVAL_SECS: u64 = 600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    // Collaborator seams; swap these for real backends at deployment
    let content = Arc::new(InMemoryContentStore::new());
    let engagement = Arc::new(InMemoryEngagementSource::new());
    let tenant_config = Arc::new(InMemoryTenantConfig::new());

    let aggregates = Arc::new(AggregateCache::new(engagement.clone(), &config.cache));
    let profiles = Arc::new(ProfileStore::new(
        engagement,
        tenant_config.clone(),
        aggregates.clone(),
        &config.cache,
    ));

    // JOB_MODE=profile-batch runs the recompute pass instead of serving
    if std::env::var("JOB_MODE").as_deref() == Ok("profile-batch") {
        info!("Running in profile batch mode");
        let job = ProfileBatchJob::new(
            ProfileBatchConfig::from_env(),
            tenant_config,
            profiles,
        );
        job.run().await?;
        return Ok(());
    }

    let ledger = Arc::new(ViewLedger::new(config.ranking.seen_lookback_hours * 2));

    let orchestrator = Arc::new(RankingOrchestrator::new(
        content,
        tenant_config,
        profiles,
        aggregates,
        ledger.clone(),
        config.ranking.clone(),
    ));

    // Periodic cleanup of expired view records
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(LEDGER_PRUNE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            ledger.prune();
        }
    });

    let state = web::Data::new(AppState {
        orchestrator,
        service_name: config.service.service_name.clone(),
    });

    info!(
        "Starting {} on HTTP:{}",
        config.service.service_name, config.service.http_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(("0.0.0.0", config.service.http_port))?
    .run()
    .await?;

    Ok(())
}
