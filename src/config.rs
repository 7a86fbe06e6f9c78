use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::limiter::QuotaConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // General
    pub log_level: String,

    // Concurrency
    pub max_workers: usize,

    // Quotas
    pub tokens_per_minute: u64,
    pub items_per_hour: u64,

    // Dedup window for already-processed items
    pub dedup_ttl_secs: u64,
}

impl Config {
    /// Load configuration from an optional `enricher.*` file and the
    /// environment (prefix `ENRICHER_`), with `.env` support.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let loader = ConfigLoader::builder()
            .set_default("log_level", "info")?
            .set_default("max_workers", 10_i64)?
            .set_default("tokens_per_minute", 200_000_i64)?
            .set_default("items_per_hour", 5_000_i64)?
            .set_default("dedup_ttl_secs", 3_600_i64)?
            .add_source(File::with_name("enricher").required(false))
            .add_source(Environment::with_prefix("ENRICHER").try_parsing(true))
            .build()?;

        let config: Config = loader.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(AppError::Init("max_workers must be at least 1".into()));
        }
        // Quota values are validated by the limiter constructors.
        self.token_quota()?;
        self.item_quota()?;
        Ok(())
    }

    /// Token-spend quota for LLM calls.
    pub fn token_quota(&self) -> Result<QuotaConfig> {
        QuotaConfig::tokens_per_minute(self.tokens_per_minute)
    }

    /// Per-item admission quota.
    pub fn item_quota(&self) -> Result<QuotaConfig> {
        QuotaConfig::items_per_hour(self.items_per_hour)
    }
}
