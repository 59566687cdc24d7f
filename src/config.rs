//! Application configuration.
//!
//! Loaded from `<settings_dir>/config.toml`; every field has a sensible
//! default so a missing file just means a stock setup.  CLI flags and
//! environment variables override on top (see [`crate::args::CommonArgs`]).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the RAG backend.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Provider preselected when the chat console opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    /// When false, API keys live in memory only and are gone on exit.
    #[serde(default = "default_true")]
    pub persist_credentials: bool,
    /// Directory holding config.toml, credentials.json, and logs.
    /// Not part of the file itself — derived from where it was loaded.
    #[serde(skip)]
    pub settings_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            default_provider: None,
            persist_credentials: true,
            settings_dir: default_settings_dir(),
        }
    }
}

/// Platform config dir + `ragchat`, falling back to the working directory.
pub fn default_settings_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ragchat")
}

impl Config {
    /// Load from the given path, or from the default settings dir when
    /// `None`.  A missing file yields the defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(|| default_settings_dir().join("config.toml"));
        let settings_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(default_settings_dir);

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Config::default()
        };
        config.settings_dir = settings_dir;
        Ok(config)
    }

    /// Write the config back to `<settings_dir>/config.toml`.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.settings_dir).with_context(|| {
            format!("Failed to create {}", self.settings_dir.display())
        })?;
        let path = self.settings_dir.join("config.toml");
        let raw = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.settings_dir.join("credentials.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.settings_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("config.toml"))).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert!(config.persist_credentials);
        assert_eq!(config.settings_dir, dir.path());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load(Some(dir.path().join("config.toml"))).unwrap();
        config.api_url = "http://backend:9000".into();
        config.default_provider = Some("gemini".into());
        config.save().unwrap();

        let reloaded = Config::load(Some(dir.path().join("config.toml"))).unwrap();
        assert_eq!(reloaded.api_url, "http://backend:9000");
        assert_eq!(reloaded.default_provider.as_deref(), Some("gemini"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"http://other:8000\"\n").unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.api_url, "http://other:8000");
        assert!(config.persist_credentials);
        assert!(config.default_provider.is_none());
    }
}
