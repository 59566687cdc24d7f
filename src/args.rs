use crate::config::Config;
use clap::{ArgAction, Args};
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Path to a config.toml file
    #[arg(short = 'c', long, value_name = "PATH", env = "RAGCHAT_CONFIG")]
    pub config: Option<PathBuf>,
    /// Settings directory (config, credentials, logs)
    #[arg(long, value_name = "DIR", env = "RAGCHAT_SETTINGS_DIR")]
    pub settings_dir: Option<PathBuf>,
    /// Base URL of the RAG backend
    #[arg(long = "api-url", value_name = "URL", env = "RAGCHAT_API_URL")]
    pub api_url: Option<String>,
    /// Provider to preselect in the chat console
    #[arg(long, value_name = "ID", env = "RAGCHAT_PROVIDER")]
    pub provider: Option<String>,
    /// Keep API keys in memory only (no credentials.json)
    #[arg(long = "no-store", action = ArgAction::SetTrue)]
    pub no_store: bool,
}

impl CommonArgs {
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(config) = &self.config {
            return Some(config.clone());
        }

        if let Some(settings_dir) = &self.settings_dir {
            return Some(settings_dir.join("config.toml"));
        }

        None
    }

    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(settings_dir) = &self.settings_dir {
            config.settings_dir = settings_dir.clone();
        }

        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }

        if let Some(provider) = &self.provider {
            config.default_provider = Some(provider.clone());
        }

        if self.no_store {
            config.persist_credentials = false;
        }
    }
}
