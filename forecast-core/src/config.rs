use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    format::Units,
    provider::openweather::{DEFAULT_BASE_URL, DEFAULT_DAYS},
};

/// Location used when the user has not picked one.
pub const DEFAULT_LOCATION: &str = "94043,USA";

/// User preferences stored on disk.
///
/// Example TOML:
/// ```toml
/// location = "London,UK"
/// api_key = "..."
/// units = "imperial"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub location: Option<String>,
    pub api_key: Option<String>,
    #[serde(default)]
    pub units: Units,
    /// Override of the forecast endpoint, mostly for testing against a mirror.
    pub base_url: Option<String>,
    pub days: Option<u8>,
}

impl Config {
    pub fn preferred_location(&self) -> &str {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_LOCATION)
    }

    pub fn set_location(&mut self, location: String) {
        self.location = Some(location);
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn forecast_days(&self) -> u8 {
        self.days.unwrap_or(DEFAULT_DAYS)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Where the loader reads the location from at the start of every load.
pub trait PreferenceSource: Send + Sync {
    fn preferred_location(&self) -> String;
}

impl PreferenceSource for Config {
    fn preferred_location(&self) -> String {
        Config::preferred_location(self).to_string()
    }
}

/// Re-reads the config file on every call so edits are picked up by the
/// next load without restarting.
#[derive(Debug, Clone)]
pub struct StoredPreferences {
    path: PathBuf,
}

impl StoredPreferences {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_default_path() -> Result<Self> {
        Ok(Self::new(Config::config_file_path()?))
    }
}

impl PreferenceSource for StoredPreferences {
    fn preferred_location(&self) -> String {
        match Config::load_from(&self.path) {
            Ok(cfg) => cfg.preferred_location().to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read preferences, using default location");
                DEFAULT_LOCATION.to_string()
            }
        }
    }
}
