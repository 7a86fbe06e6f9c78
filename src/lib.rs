pub mod analytics;
pub mod config;
pub mod enricher;
pub mod error;
pub mod limiter;
pub mod logging;
pub mod utils;

pub use crate::config::Config;
pub use crate::enricher::{Enricher, EnrichmentDriver, EnrichmentResult, Outcome};
pub use crate::error::{AppError, Result};
pub use crate::limiter::{QuotaConfig, SlidingWindowLimiter};
