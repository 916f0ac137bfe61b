use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::client::DEFAULT_BASE_URL;
use crate::model::ResponseMode;

pub const BASE_URL_ENV: &str = "QUOTATION_BASE_URL";
pub const MODE_ENV: &str = "QUOTATION_MODE";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub mode: ResponseMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: default_base_url(),
            mode: ResponseMode::default(),
            timeout_secs: default_timeout_secs(),
            log_file: None,
        }
    }

    /// Load the saved config (or defaults) and apply environment overrides.
    /// A config file that cannot be used is reported next to the fallback
    /// instead of failing the whole load.
    pub fn load() -> (Self, Option<anyhow::Error>) {
        let lookup = |key: &str| std::env::var(key).ok();
        match Self::get_config_path() {
            Ok(path) => Self::load_with_env(&path, lookup),
            Err(e) => {
                let mut config = Self::new();
                config.apply_env(lookup);
                (config, Some(e))
            }
        }
    }

    /// Environment overrides are applied whether or not `path` parsed.
    pub fn load_with_env<F>(path: &Path, lookup: F) -> (Self, Option<anyhow::Error>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut config, error) = match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(e) => (
                Self::new(),
                Some(e.context(format!("Could not read config at {}", path.display()))),
            ),
        };
        config.apply_env(lookup);
        (config, error)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Override fields from `QUOTATION_BASE_URL` / `QUOTATION_MODE`. Unknown
    /// mode values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
        if let Some(mode) = lookup(MODE_ENV).as_deref().and_then(ResponseMode::from_str) {
            self.mode = mode;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Where TUI sessions write their log
    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log_file {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?;
        Ok(cache_dir.join("quotation-client").join("client.log"))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("quotation-client").join("config.json"))
    }
}
