use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local primary config file.
pub const PROJECT_CONFIG: &str = ".workout-runner/config.yaml";
/// Optional project-local overrides.
pub const LOCAL_CONFIG: &str = ".workout-runner/local.yaml";
/// Prefix for environment overrides, nested keys split on `__`.
pub const ENV_PREFIX: &str = "WORKOUT_RUNNER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid resume_grace_period_secs: {0}. Must be at least 1")]
    InvalidGracePeriod(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .workout-runner/config.yaml
    /// 3. .workout-runner/local.yaml (optional)
    /// 4. Environment variables (WORKOUT_RUNNER_* prefix)
    pub fn load() -> Result<Config> {
        Self::load_layered(&[Path::new(PROJECT_CONFIG), Path::new(LOCAL_CONFIG)], ENV_PREFIX)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        Self::load_layered(&[path], ENV_PREFIX)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Defaults, then each file in order, then prefixed env vars.
    pub fn load_layered(files: &[&Path], env_prefix: &str) -> Result<Config> {
        let figment = files.iter().fold(
            Figment::new().merge(Serialized::defaults(Config::default())),
            |figment, file| figment.merge(Yaml::file(file)),
        );

        let config: Config = figment
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.session.resume_grace_period_secs == 0 {
            return Err(ConfigError::InvalidGracePeriod(
                config.session.resume_grace_period_secs,
            ));
        }

        Ok(())
    }
}
