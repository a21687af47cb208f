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
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind host")]
    InvalidHost,

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

    #[error("Invalid payment gateway URL format")]
    InvalidGatewayUrl,

    #[error("Payment gateway must use HTTPS in production")]
    GatewayMustBeHttps,

    #[error("Currency must be a three-letter ISO 4217 code")]
    InvalidCurrency,

    #[error("Invalid reaper interval")]
    InvalidReaperInterval,

    #[error("Reaper batch size must be between 1 and 10000")]
    InvalidBatchSize,

    #[error("Invalid store call timeout")]
    InvalidStoreTimeout,
}
