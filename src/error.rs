use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Quota error: {0}")]
    Quota(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Initialization error: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
