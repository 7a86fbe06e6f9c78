use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Counters shared across enrichment workers.
#[derive(Debug, Default)]
pub struct Stats {
    pub items_enriched: AtomicU64,
    pub items_failed: AtomicU64,
    pub items_skipped: AtomicU64,

    /// Cumulative time items spent suspended on quota gates.
    pub quota_wait_ms: AtomicU64,
    /// Latency of the most recently completed item, gauge-style.
    pub last_item_latency_ms: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_enriched(&self) {
        self.items_enriched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.items_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.items_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_wait_ms(&self, ms: u64) {
        self.quota_wait_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn update_latency_ms(&self, ms: u64) {
        self.last_item_latency_ms.store(ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            items_enriched: self.items_enriched.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
            items_skipped: self.items_skipped.load(Ordering::Relaxed),
            quota_wait_ms: self.quota_wait_ms.load(Ordering::Relaxed),
            last_item_latency_ms: self.last_item_latency_ms.load(Ordering::Relaxed),
            captured_at: Utc::now(),
        }
    }

    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            "STATS: Enriched: {} | Failed: {} | Skipped: {} | Quota wait: {}ms total | Last item: {}ms",
            s.items_enriched, s.items_failed, s.items_skipped, s.quota_wait_ms, s.last_item_latency_ms
        );
    }
}

/// Point-in-time copy of the counters, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub items_enriched: u64,
    pub items_failed: u64,
    pub items_skipped: u64,
    pub quota_wait_ms: u64,
    pub last_item_latency_ms: u64,
    pub captured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn counters_survive_concurrent_updates() {
        let stats = Arc::new(Stats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let stats = stats.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats.inc_enriched();
                    stats.add_wait_ms(5);
                    stats.update_latency_ms(50);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.items_enriched, 1_000);
        assert_eq!(snapshot.quota_wait_ms, 5_000);
        assert_eq!(snapshot.last_item_latency_ms, 50);
    }

    #[test]
    fn snapshot_serializes_for_reporting() {
        let stats = Stats::new();
        stats.inc_enriched();
        stats.inc_skipped();

        let value = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(value["items_enriched"], 1);
        assert_eq!(value["items_skipped"], 1);
        assert!(value["captured_at"].is_string());
    }
}
