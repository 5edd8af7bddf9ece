//! Configuration for the Synheart Affect Monitor.

use crate::core::thresholds::{ThresholdError, Thresholds};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on `history_retention_hours` (100 years).
pub const MAX_HISTORY_RETENTION_HOURS: u64 = 24 * 365 * 100;

/// Main configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule thresholds
    pub thresholds: Thresholds,

    /// How often the watch loop runs a check
    #[serde(with = "duration_serde")]
    pub check_interval: Duration,

    /// Observations kept in the rolling buffer fed to each check
    pub observation_buffer_size: usize,

    /// How far back `history` and `report` look by default (in hours)
    pub history_retention_hours: u64,

    /// IANA timezone used for report headers
    pub timezone: String,

    /// Path for storing issue history and audit stats
    pub data_path: PathBuf,

    /// Path for writing report files
    pub report_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-affect-monitor");

        Self {
            thresholds: Thresholds::default(),
            check_interval: Duration::from_secs(2),
            observation_buffer_size: 100,
            history_retention_hours: 24,
            timezone: "UTC".to_string(),
            report_path: data_dir.join("reports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-affect-monitor")
            .join("config.json")
    }

    /// Check thresholds, timezone and size limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        self.tz()?;
        if self.observation_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "observation_buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.history_retention_hours > MAX_HISTORY_RETENTION_HOURS {
            return Err(ConfigError::Invalid(format!(
                "history_retention_hours must be at most {MAX_HISTORY_RETENTION_HOURS}"
            )));
        }
        Ok(())
    }

    /// Parse the configured report timezone.
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone: {}", self.timezone)))
    }

    /// Path of the persisted issue history.
    pub fn history_file(&self) -> PathBuf {
        self.data_path.join("issue_history.json")
    }

    /// Path of the persisted audit statistics.
    pub fn audit_file(&self) -> PathBuf {
        self.data_path.join("audit.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        std::fs::create_dir_all(&self.report_path)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Invalid thresholds: {0}")]
    Thresholds(#[from] ThresholdError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
