//! Configuration for keystroke authentication.

use crate::core::capture::DEFAULT_POLL_INTERVAL;
use crate::core::dtw::Dtw;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Password, threshold and sample count shared by enroll and verify.
///
/// Read-only once an authentication context has been built from it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    /// Password the user types for every sample
    pub password: String,
    /// Attempts with a DTW distance strictly below this are accepted
    pub threshold: f64,
    /// Number of samples captured during enrollment
    pub sample_count: usize,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            password: "frappe123".to_string(),
            threshold: 1.5,
            sample_count: 3,
        }
    }
}

impl std::fmt::Debug for AuthenticationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationConfig")
            .field("password", &"<redacted>")
            .field("threshold", &self.threshold)
            .field("sample_count", &self.sample_count)
            .finish()
    }
}

impl AuthenticationConfig {
    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.password.is_empty() {
            return Err(ConfigError::Invalid("password must not be empty".into()));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if self.sample_count == 0 {
            return Err(ConfigError::Invalid(
                "sample_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Authentication parameters
    pub auth: AuthenticationConfig,

    /// Sakoe-Chiba window for DTW; `None` searches the full matrix
    #[serde(default)]
    pub dtw_window: Option<usize>,

    /// How often an idle capture checks for cancellation
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,

    /// Directory for the enrolled profile and audit log
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-keystroke");

        Self {
            auth: AuthenticationConfig::default(),
            dtw_window: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.auth.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-keystroke")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// The distance engine these settings describe.
    pub fn distance_engine(&self) -> Dtw {
        match self.dtw_window {
            Some(radius) => Dtw::banded(radius),
            None => Dtw::exact(),
        }
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

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
