//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the
//! user's config directory, then `GAMEFLIX_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory under the platform config/data roots.
pub const APP_DIR: &str = "gameflix";
/// Gamebrain production endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.gamebrain.co";
/// Request timeout applied to every API call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_CONFIG: &str = r#"# Gameflix configuration

# Base URL of the Gamebrain API.
api_base_url = "https://api.gamebrain.co"

# Bearer token sent with every request. Can also be set with GAMEFLIX_API_KEY.
api_key = ""

# Timeout for a single API request, in seconds.
request_timeout_secs = 30

# Where favorites and logs are stored. Defaults to the platform data directory.
# data_dir = "/path/to/gameflix"
"#;

/// Resolved runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the catalog API.
    pub api_base_url: String,
    /// Bearer token. Blank means unauthenticated.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Root for favorites and log files.
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (optional) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("api_key", defaults.api_key)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("GAMEFLIX"))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }

    /// File holding persisted favorites.
    pub fn favorites_path(&self) -> PathBuf {
        self.data_dir.join("favorites.json")
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Location of `config.toml` under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a commented default configuration file if none exists.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_path())
}

fn write_default_config(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            format!(
                "api_base_url = \"http://localhost:9000\"\nrequest_timeout_secs = 5\ndata_dir = \"{}\"\n",
                dir.path().join("data").display()
            ),
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(
            config.favorites_path(),
            dir.path().join("data").join("favorites.json")
        );
        Ok(())
    }

    #[test]
    fn default_config_is_written_once_and_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        write_default_config(&path)?;
        assert!(path.exists());

        fs::write(&path, "api_key = \"kept\"\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "api_key = \"kept\"\n");

        fs::write(&path, DEFAULT_CONFIG)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        Ok(())
    }
}
