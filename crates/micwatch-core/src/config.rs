//! Configuration management for micwatch.
//!
//! Settings are read from a TOML file in the user's configuration directory.
//! A missing file is not an error, every field has a default.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::APP_NAME;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// How state events are written to the output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Marker line followed by a human-readable status line
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Error)]
#[error("unknown output format {0:?}, expected \"text\" or \"json\"")]
pub struct ParseFormatError(String);

impl FromStr for OutputFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// Configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Time between two polls of the record source, in milliseconds
    #[serde(
        default = "default_poll_interval_ms",
        skip_serializing_if = "is_default_poll_interval_ms"
    )]
    pub poll_interval_ms: u64,

    /// Output format of the state stream
    #[serde(default, skip_serializing_if = "is_default_format")]
    pub format: OutputFormat,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn is_default_poll_interval_ms(v: &u64) -> bool {
    *v == DEFAULT_POLL_INTERVAL_MS
}

fn is_default_format(v: &OutputFormat) -> bool {
    *v == OutputFormat::default()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.poll_interval_ms > 0,
            "poll_interval_ms must be greater than zero"
        );
        Ok(())
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a new ConfigManager reading from an explicit file.
    pub fn with_config_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Creates a new ConfigManager with a specified configuration directory.
    #[cfg(test)]
    pub fn with_config_dir<P: AsRef<Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(format!("{}.toml", APP_NAME));
        Self { config_path }
    }

    /// Returns the default path to the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
        Ok(config_dir.join(APP_NAME).join(format!("{}.toml", APP_NAME)))
    }

    /// Loads the configuration from the config file or returns default.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            debug!(path = ?self.config_path, "no config file, using defaults");
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file at {:?}", self.config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file at {:?}", self.config_path))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file at {:?}", self.config_path))?;

        Ok(config)
    }

    /// Saves the configuration to the config file.
    pub fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self
            .config_path
            .parent()
            .with_context(|| format!("Failed to get parent directory of {:?}", self.config_path))?;

        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {:?}", config_dir))?;

        let serialized =
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_default_config_serializes_empty() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(serialized.trim().is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            poll_interval_ms: 250,
            format: OutputFormat::Json,
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(serialized.contains("format = \"json\""));
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_config_manager_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_dir(temp_dir.path());

        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn test_config_manager_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_dir(temp_dir.path().join("nested"));

        let config = Config {
            poll_interval_ms: 500,
            ..Default::default()
        };

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_config_manager_rejects_zero_interval() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("micwatch.toml");
        fs::write(&path, "poll_interval_ms = 0\n").unwrap();

        let manager = ConfigManager::with_config_path(&path);
        assert!(manager.load().is_err());
    }

    #[test]
    fn test_config_manager_rejects_garbage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("micwatch.toml");
        fs::write(&path, "format = \"yaml\"\n").unwrap();

        let manager = ConfigManager::with_config_path(&path);
        assert!(manager.load().is_err());
    }
}
