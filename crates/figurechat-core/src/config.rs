use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::error::RosterError;
use crate::figure::{Figure, Roster};
use crate::retry::RetryPolicy;

pub const API_BASE_ENV: &str = "FIGURECHAT_API_BASE";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    /// Replaces the built-in roster when set.
    pub figures: Option<Vec<Figure>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Base URL of the chat backend: environment, then file, then default.
    pub fn api_base(&self) -> String {
        self.api_base_with_env(std::env::var(API_BASE_ENV).ok())
    }

    fn api_base_with_env(&self, env: Option<String>) -> String {
        let base = env
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        base.trim().trim_end_matches('/').to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(default.max_retries),
            backoff: self
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(default.backoff),
        }
    }

    pub fn roster(&self) -> Result<Roster, RosterError> {
        match &self.figures {
            Some(figures) => Roster::new(figures.clone()),
            None => Ok(Roster::default()),
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("figurechat"))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}
