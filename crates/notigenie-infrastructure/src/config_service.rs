//! Configuration loading.
//!
//! Reads `config.toml`; a missing file yields the defaults. The loaded value
//! is validated before it is handed out.

use crate::paths::NotiPaths;
use notigenie_core::config::AppConfig;
use notigenie_core::{NotiError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Service for the default `config.toml` location.
    pub fn from_paths(paths: &NotiPaths) -> Self {
        Self::new(paths.config_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppConfig> {
        let config = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path).map_err(|e| {
                NotiError::config(format!("Failed to read {}: {}", self.path.display(), e))
            })?;
            Self::parse(&content)?
        } else {
            info!(path = %self.path.display(), "No configuration file; using defaults");
            AppConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| NotiError::config(format!("Invalid config.toml: {}", e)))
    }
}
