// Profile batch job.
//
// Background job that periodically rebuilds user profiles, tenant by
// tenant. Designed to run as a CronJob (run_once) or a long-lived
// worker (interval loop). Per-user failures are isolated inside the
// profile store; a tenant whose data source is down is skipped and
// retried on the next pass.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info};

use crate::services::collaborators::TenantConfigStore;
use crate::services::profile::ProfileStore;

#[derive(Debug, Clone)]
pub struct ProfileBatchConfig {
    /// Delay between tenants, to avoid hammering the data sources
    pub tenant_delay_ms: u64,
    /// Whether to exit after one full pass
    pub run_once: bool,
    /// Interval between full passes (if not run_once)
    pub interval_secs: u64,
}

impl Default for ProfileBatchConfig {
    fn default() -> Self {
        Self {
            tenant_delay_ms: 250,
            run_once: true,
            interval_secs: 3600 * 4, // 4 hours
        }
    }
}

impl ProfileBatchConfig {
    pub fn from_env() -> Self {
        Self {
            tenant_delay_ms: std::env::var("PROFILE_TENANT_DELAY_MS")
                .unwrap_or_else(|_| "250".to_string())
                .parse()
                .unwrap_or(250),
            run_once: std::env::var("PROFILE_RUN_ONCE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            interval_secs: std::env::var("PROFILE_INTERVAL_SECS")
                .unwrap_or_else(|_| "14400".to_string())
                .parse()
                .unwrap_or(14400),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchJobStats {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub tenants_processed: u32,
    pub users_processed: u32,
    pub users_succeeded: u32,
    pub users_failed: u32,
    pub total_duration_ms: u64,
}

pub struct ProfileBatchJob {
    config: ProfileBatchConfig,
    tenant_config: Arc<dyn TenantConfigStore>,
    profiles: Arc<ProfileStore>,
}

impl ProfileBatchJob {
    pub fn new(
        config: ProfileBatchConfig,
        tenant_config: Arc<dyn TenantConfigStore>,
        profiles: Arc<ProfileStore>,
    ) -> Self {
        Self {
            config,
            tenant_config,
            profiles,
        }
    }

    /// Run the batch job: one pass, or an interval loop.
    pub async fn run(&self) -> Result<BatchJobStats> {
        loop {
            let stats = self.run_single_pass().await?;

            info!(
                tenants = stats.tenants_processed,
                processed = stats.users_processed,
                succeeded = stats.users_succeeded,
                failed = stats.users_failed,
                duration_ms = stats.total_duration_ms,
                "Profile batch job pass completed"
            );

            if self.config.run_once {
                return Ok(stats);
            }

            info!(
                interval_secs = self.config.interval_secs,
                "Sleeping until next pass"
            );
            sleep(Duration::from_secs(self.config.interval_secs)).await;
        }
    }

    async fn run_single_pass(&self) -> Result<BatchJobStats> {
        let start_time = Instant::now();
        let mut stats = BatchJobStats {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        let tenants = self
            .tenant_config
            .active_tenants()
            .await
            .context("fetching active tenants")?;

        info!(tenant_count = tenants.len(), "Starting profile batch pass");

        for tenant_id in tenants {
            let tenant_stats = self.profiles.recompute_all(tenant_id).await;

            stats.tenants_processed += 1;
            stats.users_processed += tenant_stats.users_processed as u32;
            stats.users_succeeded += tenant_stats.users_succeeded as u32;
            stats.users_failed += tenant_stats.users_failed as u32;

            if tenant_stats.users_processed > 0 && tenant_stats.users_succeeded == 0 {
                error!(
                    tenant_id = %tenant_id,
                    "All profile recomputes failed for tenant"
                );
            }

            if self.config.tenant_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.tenant_delay_ms)).await;
            }
        }

        stats.completed_at = Some(Utc::now());
        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;

        Ok(stats)
    }
}
