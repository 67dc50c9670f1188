use serde::{Deserialize, Serialize};

/// Main configuration structure for the workout runner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Retry policy for persistence calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Session lifecycle tuning
    #[serde(default)]
    pub session: SessionConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".workout-runner/sessions.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation for file logs: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    250
}

const fn default_max_backoff_ms() -> u64 {
    5_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// How long resumable lookup and completion fetch may keep failing
    /// before the session is treated as new
    #[serde(default = "default_resume_grace_period_secs")]
    pub resume_grace_period_secs: u64,

    /// Sync-then-revalidate rounds `complete_workout` may run before giving up
    #[serde(default = "default_completion_retry_budget")]
    pub completion_retry_budget: u32,

    /// Complete anyway, with a logged inconsistency, once the budget is spent
    /// and only unsaved completions remain
    #[serde(default = "default_true")]
    pub force_complete_on_exhaustion: bool,
}

const fn default_resume_grace_period_secs() -> u64 {
    10
}

const fn default_completion_retry_budget() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resume_grace_period_secs: default_resume_grace_period_secs(),
            completion_retry_budget: default_completion_retry_budget(),
            force_complete_on_exhaustion: default_true(),
        }
    }
}
