//! Configuration management for the CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Optional CLI defaults loaded from the user's config file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default namespace when -n is not given
    pub default_namespace: Option<String>,
    /// Default output format when -o is not given
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("pod-doctor").join("config.json"))
    }
}
