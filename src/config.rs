use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/research/process";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Research endpoint used for both summaries and topic suggestions.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_notification_seconds")]
    pub notification_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("research-notes");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("research.db").to_string_lossy().to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_notification_seconds() -> u64 {
    3
}

fn default_user_agent() -> String {
    "research-notes/0.1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            api_url: default_api_url(),
            notification_seconds: default_notification_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Reads the config at `path`, writing the defaults there first if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("research-notes")
            .join("config.toml")
    }
}
