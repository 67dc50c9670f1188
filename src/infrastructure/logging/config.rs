use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::models::LoggingConfig;

/// Resolved logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Console output format
    pub format: LogFormat,

    /// Directory for log files (if None, logs go to the console only)
    pub log_dir: Option<PathBuf>,

    /// File rotation policy
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl RotationPolicy {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "hourly" => Some(Self::Hourly),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

/// Unknown format or rotation strings fall back to the defaults; the
/// config loader has already rejected them.
impl From<&LoggingConfig> for LogConfig {
    fn from(settings: &LoggingConfig) -> Self {
        Self {
            level: settings.level.clone(),
            format: LogFormat::from_str(&settings.format).unwrap_or_default(),
            log_dir: settings.log_dir.as_ref().map(PathBuf::from),
            rotation: RotationPolicy::from_str(&settings.rotation).unwrap_or_default(),
        }
    }
}
