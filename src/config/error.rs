//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid host address: {0}")]
    InvalidHost(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Oracle timeout must be between 1 and 120 seconds")]
    InvalidOracleTimeout,

    #[error("{0} must be between 0 and 1")]
    InvalidThreshold(&'static str),

    #[error("Maximum message length must be positive")]
    InvalidMessageLimit,

    #[error("Oracle interpretation mode requires an OpenAI API key")]
    OracleRequiresApiKey,

    #[error("Oracle consultation with retries must finish within the request timeout")]
    OracleWindowTooLong,
}
