use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::providers::awesome::{DEFAULT_ENDPOINT, DEFAULT_PAIR};

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_pair() -> String {
    DEFAULT_PAIR.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Base URL of the exchange rate API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Currency pair to quote, foreign-local, e.g. "USD-BRL".
    #[serde(default = "default_pair")]
    pub pair: String,
    /// Overrides the ledger location; defaults to the platform data dir.
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            endpoint: default_endpoint(),
            pair: default_pair(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to defaults when none
    /// exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file, using defaults");
            return Ok(AppConfig::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fintrack", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "fintrack", "fintrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Local (second) leg of the configured pair.
    pub fn local_currency(&self) -> &str {
        self.pair.split('-').nth(1).unwrap_or("BRL")
    }

    /// Foreign (first) leg of the configured pair.
    pub fn foreign_currency(&self) -> &str {
        self.pair.split('-').next().unwrap_or("USD")
    }
}
