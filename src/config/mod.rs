//! Configuration storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default backend when neither the config file nor `--server` names one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8090";

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend server base URL
    pub server_url: Option<String>,
    /// Display name offered as the default in the join form
    pub display_name: Option<String>,
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "inbox-cli", "inbox-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Resolve the backend URL: explicit flag, then config file, then the
    /// built-in default.
    pub fn resolve_server_url(&self, flag: Option<&str>) -> String {
        flag.map(String::from)
            .or_else(|| self.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_server_url_precedence() {
        let mut config = Config::default();
        assert_eq!(config.resolve_server_url(None), DEFAULT_SERVER_URL);

        config.server_url = Some("http://configured:9000".to_string());
        assert_eq!(config.resolve_server_url(None), "http://configured:9000");
        assert_eq!(
            config.resolve_server_url(Some("http://flag:7000")),
            "http://flag:7000"
        );
    }
}
