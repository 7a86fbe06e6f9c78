use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::dedup::DedupCache;
use super::pool::WorkerPool;
use super::Enricher;
use crate::analytics::stats::Stats;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::limiter::SlidingWindowLimiter;
use crate::utils::time::{elapsed_ms, now_instant};

/// How one item left the driver.
#[derive(Debug)]
pub enum Outcome<O> {
    Enriched(O),
    Skipped,
    Failed(AppError),
}

#[derive(Debug)]
pub struct EnrichmentResult<O> {
    pub id: String,
    pub outcome: Outcome<O>,
    /// Total time the item spent suspended on quota gates.
    pub waited: Duration,
}

/// Fans a collection of items out over a bounded worker pool, gating every
/// external call on the shared quota limiters.
///
/// The driver's contract is the aggregate bound: no more than the
/// configured capacity of quota units is admitted per rolling window, no
/// matter how many workers are active. Items are processed in no
/// particular order; a collaborator failure marks that item failed and
/// never aborts the batch. There is no per-item deadline; callers that
/// need one should enforce it between runs.
pub struct EnrichmentDriver<E: Enricher> {
    enricher: Arc<E>,
    token_quota: Arc<SlidingWindowLimiter>,
    item_quota: Arc<SlidingWindowLimiter>,
    pool: WorkerPool,
    seen: DedupCache,
    stats: Arc<Stats>,
    run_id: Uuid,
}

impl<E: Enricher> EnrichmentDriver<E> {
    pub fn new(enricher: E, config: &Config) -> Result<Self> {
        let run_id = Uuid::new_v4();
        info!(
            "Enrichment driver {} ready: {} workers, {} tokens/min, {} items/hr",
            run_id, config.max_workers, config.tokens_per_minute, config.items_per_hour
        );

        Ok(Self {
            enricher: Arc::new(enricher),
            token_quota: Arc::new(SlidingWindowLimiter::new(config.token_quota()?)),
            item_quota: Arc::new(SlidingWindowLimiter::new(config.item_quota()?)),
            pool: WorkerPool::new(config.max_workers),
            seen: DedupCache::new(Duration::from_secs(config.dedup_ttl_secs)),
            stats: Arc::new(Stats::new()),
            run_id,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }

    /// Token spend currently inside the trailing window.
    pub fn token_usage(&self) -> u64 {
        self.token_quota.current_usage()
    }

    /// Process every item, returning one result per input.
    pub async fn run(&self, items: Vec<E::Item>) -> Vec<EnrichmentResult<E::Output>> {
        let total = items.len();
        info!("Run {}: dispatching {} items", self.run_id, total);
        self.seen.cleanup();

        let mut ids = Vec::with_capacity(total);
        let mut handles = Vec::with_capacity(total);
        for item in items {
            let ctx = self.context();
            ids.push(self.enricher.item_id(&item));
            handles.push(tokio::spawn(async move { ctx.process(item).await }));
        }

        let mut results = Vec::with_capacity(total);
        for (id, joined) in ids.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!("Worker task for {} failed: {}", id, e);
                    self.stats.inc_failed();
                    results.push(EnrichmentResult {
                        id,
                        outcome: Outcome::Failed(AppError::Worker(e.to_string())),
                        waited: Duration::ZERO,
                    });
                }
            }
        }

        self.stats.log_summary();
        results
    }

    fn context(&self) -> WorkerContext<E> {
        WorkerContext {
            enricher: self.enricher.clone(),
            token_quota: self.token_quota.clone(),
            item_quota: self.item_quota.clone(),
            pool: self.pool.clone(),
            seen: self.seen.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Cloned set of shared handles moved into each worker task.
struct WorkerContext<E: Enricher> {
    enricher: Arc<E>,
    token_quota: Arc<SlidingWindowLimiter>,
    item_quota: Arc<SlidingWindowLimiter>,
    pool: WorkerPool,
    seen: DedupCache,
    stats: Arc<Stats>,
}

impl<E: Enricher> WorkerContext<E> {
    async fn process(&self, item: E::Item) -> EnrichmentResult<E::Output> {
        let id = self.enricher.item_id(&item);

        if !self.seen.check_and_insert(&id) {
            debug!("{} already processed, skipping", id);
            self.stats.inc_skipped();
            return EnrichmentResult {
                id,
                outcome: Outcome::Skipped,
                waited: Duration::ZERO,
            };
        }

        let _permit = self.pool.acquire().await;
        let started = now_instant();
        let mut waited = Duration::ZERO;

        // One unit of the item quota per admission, spent up front.
        match self.item_quota.wait_for(1).await {
            Ok(w) => waited += w,
            Err(e) => return self.fail(id, e, waited),
        }
        self.item_quota.record(1);

        let planned = self.enricher.planned_cost(&item);
        match self.token_quota.wait_for(planned).await {
            Ok(w) => waited += w,
            Err(e) => return self.fail(id, e, waited),
        }
        self.stats.add_wait_ms(waited.as_millis() as u64);

        match self.enricher.enrich(&item).await {
            Ok(output) => {
                // Prefer the collaborator's observed spend; estimates are
                // only a planning figure.
                let spent = self.enricher.actual_cost(&output).unwrap_or(planned);
                self.token_quota.record(spent);
                self.stats.inc_enriched();
                self.stats.update_latency_ms(elapsed_ms(started));
                debug!("{} enriched ({} units)", id, spent);
                EnrichmentResult {
                    id,
                    outcome: Outcome::Enriched(output),
                    waited,
                }
            }
            Err(e) => {
                error!("Enrichment failed for {}: {}", id, e);
                self.fail(id, e, waited)
            }
        }
    }

    fn fail(
        &self,
        id: String,
        err: AppError,
        waited: Duration,
    ) -> EnrichmentResult<E::Output> {
        self.stats.inc_failed();
        EnrichmentResult {
            id,
            outcome: Outcome::Failed(err),
            waited,
        }
    }
}
