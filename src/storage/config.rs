//! Application configuration.
//!
//! Loaded from `config.toml` in the platform data directory; a missing file
//! yields defaults. Sections map one-to-one onto the services, speech and
//! sync engine settings.

use crate::speech::SpeechOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Remote service endpoints
    pub services: ServiceSettings,
    /// Narration voice settings
    pub narration: NarrationSettings,
    /// Synchronization engine settings
    pub sync: SyncSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            services: ServiceSettings::default(),
            narration: NarrationSettings::default(),
            sync: SyncSettings::default(),
        }
    }
}

/// Remote service endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Description storage endpoint
    pub descriptions_url: String,
    /// Video catalog endpoint
    pub videos_url: String,
    /// Question answering endpoint
    pub ask_url: String,
    /// Timeout for ordinary requests in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            descriptions_url: "http://localhost:8080/descriptions".to_string(),
            videos_url: "http://localhost:8080/videos".to_string(),
            ask_url: "http://localhost:8080/ask".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServiceSettings {
    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Narration voice settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Speech rate (0.5 - 2.0)
    pub rate: f32,
    /// Pitch (0.0 - 2.0)
    pub pitch: f32,
    /// Volume (0.0 - 1.0)
    pub volume: f32,
    /// Voice to use when the engine offers it
    pub preferred_voice: Option<String>,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            preferred_voice: Some("Google US English".to_string()),
        }
    }
}

impl NarrationSettings {
    /// Speech options for each utterance, clamped to supported ranges.
    pub fn speech_options(&self) -> SpeechOptions {
        SpeechOptions {
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
            voice: self.preferred_voice.clone(),
        }
        .clamped()
    }
}

/// Synchronization engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Whether descriptions are narrated when a session starts
    pub descriptions_enabled: bool,
    /// Sampling interval for embedded players in milliseconds
    pub poll_interval_ms: u64,
    /// Time samples are truncated to this many seconds
    pub time_granularity_secs: f64,
    /// Extra attempts for a rejected play command; pauses retry while in range
    pub control_retry_limit: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            descriptions_enabled: true,
            poll_interval_ms: 250,
            time_granularity_secs: 1.0,
            control_retry_limit: 1,
        }
    }
}

impl SyncSettings {
    /// Polling interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "vidscribe", "VidScribe")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load application configuration from `path`; defaults if it does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&get_config_path(), config)
}

/// Save application configuration to `path`.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
