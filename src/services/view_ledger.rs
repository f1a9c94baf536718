// Deduplication store for items already shown to a user.
//
// Records are unique per (user, item) within the lookback window and are
// used only for exclusion, never for scoring. Writes happen as a
// fire-and-forget side effect after a ranked page is served; a failed
// write is logged and never fails the response.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::models::ViewRecord;

pub struct ViewLedger {
    // (user, tenant) -> item -> last shown at
    records: DashMap<(Uuid, Uuid), HashMap<Uuid, DateTime<Utc>>>,
    retention: Duration,
}

impl ViewLedger {
    pub fn new(retention_hours: i64) -> Self {
        Self {
            records: DashMap::new(),
            retention: Duration::hours(retention_hours),
        }
    }

    /// Record that an item was shown. Re-showing an item refreshes the
    /// timestamp; records are never otherwise updated.
    pub fn record_view(&self, user_id: Uuid, tenant_id: Uuid, item_id: Uuid) {
        self.records
            .entry((user_id, tenant_id))
            .or_default()
            .insert(item_id, Utc::now());
    }

    pub fn record_views(&self, user_id: Uuid, tenant_id: Uuid, item_ids: &[Uuid]) {
        let now = Utc::now();
        let mut entry = self.records.entry((user_id, tenant_id)).or_default();
        for item_id in item_ids {
            entry.insert(*item_id, now);
        }
        debug!(
            user_id = %user_id,
            count = item_ids.len(),
            "Recorded view events"
        );
    }

    /// Items shown to the user within the lookback window.
    pub fn seen_set(&self, user_id: Uuid, tenant_id: Uuid, lookback: Duration) -> HashSet<Uuid> {
        let cutoff = Utc::now() - lookback;
        self.records
            .get(&(user_id, tenant_id))
            .map(|items| {
                items
                    .iter()
                    .filter(|(_, &viewed_at)| viewed_at >= cutoff)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn records_for(&self, user_id: Uuid, tenant_id: Uuid) -> Vec<ViewRecord> {
        self.records
            .get(&(user_id, tenant_id))
            .map(|items| {
                items
                    .iter()
                    .map(|(id, viewed_at)| ViewRecord {
                        user_id,
                        item_id: *id,
                        tenant_id,
                        viewed_at: *viewed_at,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop records past the retention window. Run on a schedule.
    pub fn prune(&self) -> usize {
        let cutoff = Utc::now() - self.retention;
        let mut pruned = 0;
        self.records.retain(|_, items| {
            let before = items.len();
            items.retain(|_, viewed_at| *viewed_at >= cutoff);
            pruned += before - items.len();
            !items.is_empty()
        });
        if pruned > 0 {
            debug!(pruned, "Pruned expired view records");
        }
        pruned
    }
}
