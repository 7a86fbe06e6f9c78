use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

/// Caps the number of enrichment calls in flight at once.
///
/// Concurrency and quota are separate concerns: the pool bounds how many
/// workers are active, the sliding-window limiter bounds how much they
/// spend.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        // The semaphore is never closed while the pool is alive.
        self.semaphore.acquire().await.expect("semaphore closed")
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
