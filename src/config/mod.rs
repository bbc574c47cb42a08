//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TROUBLESHOOTER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use diy_troubleshooter::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod database;
mod engine;
mod error;
mod server;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use engine::{EngineConfig, InterpretationMode};
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// in-memory, keyword-only service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Language oracle configuration (OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// Session engine tuning
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TROUBLESHOOTER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TROUBLESHOOTER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TROUBLESHOOTER__ENGINE__INTERPRETATION_MODE=oracle`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TROUBLESHOOTER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any section is invalid, or if oracle
    /// interpretation is selected without an API key or with retries that
    /// could outlast the HTTP request timeout.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.ai.validate()?;
        self.engine.validate()?;

        if self.engine.interpretation_mode == InterpretationMode::Oracle {
            if !self.ai.has_openai() {
                return Err(ValidationError::OracleRequiresApiKey);
            }
            if self.ai.consult_window() >= self.server.request_timeout() {
                return Err(ValidationError::OracleWindowTooLong);
            }
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
