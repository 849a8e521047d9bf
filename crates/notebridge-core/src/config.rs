//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/notebridge/config.toml)
//! 3. Environment variables (NOTEBRIDGE_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::IMAGES_DIR;

/// Environment variable prefix
const ENV_PREFIX: &str = "NOTEBRIDGE";

/// Quiet window before an edit is autosaved
pub const DEFAULT_AUTOSAVE_MS: u64 = 2000;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of notes, state items, user images and exports
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Host the content interceptor serves user images from
    #[serde(default = "default_virtual_host")]
    pub virtual_host: String,

    /// Scheme of virtual image URLs
    #[serde(default = "default_url_scheme")]
    pub url_scheme: String,

    /// Autosave debounce window in milliseconds
    #[serde(default = "default_autosave_ms")]
    pub autosave_ms: u64,

    /// Where exported notes are written (defaults to `<data_dir>/exports`)
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Log level for the tracing subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            virtual_host: default_virtual_host(),
            url_scheme: default_url_scheme(),
            autosave_ms: default_autosave_ms(),
            export_dir: None,
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file (~/.config/notebridge/config.toml or NOTEBRIDGE_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Configuration rooted at `data_dir` with every other value defaulted
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_VIRTUAL_HOST", ENV_PREFIX)) {
            if !val.is_empty() {
                self.virtual_host = val;
            }
        }

        // Non-numeric values are ignored rather than rejected
        if let Ok(val) = std::env::var(format!("{}_AUTOSAVE_MS", ENV_PREFIX)) {
            if let Ok(ms) = val.trim().parse() {
                self.autosave_ms = ms;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.log_level = val;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with NOTEBRIDGE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notebridge")
            .join("config.toml")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("exports"))
    }

    /// Base of virtual image URLs, without trailing slash
    pub fn image_url_base(&self) -> String {
        format!("{}://{}/{}", self.url_scheme, self.virtual_host, IMAGES_DIR)
    }

    pub fn autosave_window(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }

    /// Set a single value by key, as `notebridge config set` does
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "virtual_host" => self.virtual_host = value.to_string(),
            "url_scheme" => self.url_scheme = value.to_string(),
            "autosave_ms" => {
                self.autosave_ms = value
                    .parse()
                    .with_context(|| format!("autosave_ms must be a number, got '{}'", value))?
            }
            "export_dir" => {
                self.export_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            "log_level" => self.log_level = value.to_string(),
            "log_file" => {
                self.log_file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            _ => anyhow::bail!(
                "Unknown config key '{}'. Valid keys: data_dir, virtual_host, url_scheme, \
                 autosave_ms, export_dir, log_level, log_file",
                key
            ),
        }
        Ok(())
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notebridge")
}

fn default_virtual_host() -> String {
    "appassets.local".to_string()
}

fn default_url_scheme() -> String {
    "https".to_string()
}

fn default_autosave_ms() -> u64 {
    DEFAULT_AUTOSAVE_MS
}

fn default_log_level() -> String {
    "warn".to_string()
}
