mod dedup;
mod driver;
mod pool;

pub use dedup::DedupCache;
pub use driver::{EnrichmentDriver, EnrichmentResult, Outcome};
pub use pool::WorkerPool;

use async_trait::async_trait;

use crate::error::Result;

/// A quota-bearing enrichment operation over one item.
///
/// Implementations own the external call (profile lookup, web search, LLM
/// classification); the driver owns admission. For every item it gates the
/// call on the shared quota limiters and records the spend afterwards, so
/// implementations should not sleep or throttle on their own.
#[async_trait]
pub trait Enricher: Send + Sync + 'static {
    type Item: Send + Sync + 'static;
    type Output: Send + 'static;

    /// Stable identifier for the item, used for dedup and reporting.
    fn item_id(&self, item: &Self::Item) -> String;

    /// Planned quota spend for enriching this item, in the token
    /// limiter's units.
    fn planned_cost(&self, item: &Self::Item) -> u64;

    /// Perform the external call.
    async fn enrich(&self, item: &Self::Item) -> Result<Self::Output>;

    /// Observed spend for a completed call, when the collaborator can
    /// report one. The driver falls back to the planned estimate.
    fn actual_cost(&self, _output: &Self::Output) -> Option<u64> {
        None
    }
}
