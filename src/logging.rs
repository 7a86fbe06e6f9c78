use tracing_subscriber::EnvFilter;

use crate::error::{AppError, Result};

/// Install the global tracing subscriber.
///
/// `level` is an env-filter directive, e.g. `"info"` or
/// `"bluesky_enricher=debug"`. Fails if a subscriber is already installed.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| AppError::Init(format!("invalid log filter '{}': {}", level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| AppError::Init(format!("failed to install subscriber: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_filter() {
        assert!(init("limiter=notalevel").is_err());
    }
}
