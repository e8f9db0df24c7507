//! Configuration management for scrapefrb.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::SourceCode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/scrapefrb/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General application settings
    pub general: GeneralConfig,
    /// Fetching and pagination behavior
    pub scanning: ScanningConfig,
    /// Download behavior
    pub download: DownloadConfig,
    /// Source selection
    pub sources: SourcesConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SCRAPEFRB_WORKDIR`: Override the working directory
    /// - `SCRAPEFRB_MAX_ATTEMPTS`: Override the fetch attempt limit
    /// - `SCRAPEFRB_USER_AGENT`: Override the HTTP user agent
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SCRAPEFRB_WORKDIR") {
            if !val.trim().is_empty() {
                tracing::debug!("Override general.workdir from env: {}", val);
                self.general.workdir = Some(PathBuf::from(val));
            }
        }

        if let Some(val) = lookup("SCRAPEFRB_MAX_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                self.scanning.max_attempts = attempts;
                tracing::debug!("Override scanning.max_attempts from env: {}", attempts);
            }
        }

        if let Some(val) = lookup("SCRAPEFRB_USER_AGENT") {
            tracing::debug!("Override scanning.user_agent from env");
            self.scanning.user_agent = val;
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scanning.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanning.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.scanning.max_pager_rounds == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "scanning.max_pager_rounds".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve the working directory: explicit override, then config, then the data dir.
    pub fn resolve_workdir(&self, override_dir: Option<&Path>) -> ConfigResult<PathBuf> {
        if let Some(dir) = override_dir {
            return Ok(dir.to_path_buf());
        }
        match &self.general.workdir {
            Some(dir) => Ok(dir.clone()),
            None => Self::data_dir(),
        }
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/scrapefrb/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("org", "scrapefrb", "scrapefrb").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path, the default working directory.
    ///
    /// Uses XDG base directories: `~/.local/share/scrapefrb`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("org", "scrapefrb", "scrapefrb").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Working directory holding `downloads/`, `log/` and the store file
    pub workdir: Option<PathBuf>,
}

/// Fetching and pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Attempts per network fetch before the unit of work is degraded
    pub max_attempts: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Overrides the per-source postback round cap when set
    pub max_pager_rounds: Option<u32>,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            timeout_secs: 60,
            user_agent: "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/30.0.1599.101 Safari/537.36"
                .to_string(),
            max_pager_rounds: None,
        }
    }
}

/// Download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Show a console progress bar per file
    pub show_progress: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

/// Source selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Sources scraped when no per-source flag is given on the command line
    pub enabled: Vec<SourceCode>,
    /// Directory of source definition TOML files replacing the built-in ones
    pub definitions_dir: Option<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: SourceCode::ALL.to_vec(),
            definitions_dir: None,
        }
    }
}
