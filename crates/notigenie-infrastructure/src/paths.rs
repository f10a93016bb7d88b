//! Unified path management for NotiGenie files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/notigenie/         # Config directory
//! ├── config.toml              # Application configuration
//! ├── secret.json              # API keys
//! ├── schemas/                 # One <logical_name>.json per database
//! └── conversations/           # One <session>.toml per session
//! ```

use notigenie_core::config::AppConfig;
use notigenie_core::{NotiError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "notigenie";

/// Resolves file locations, rooted at the user config dir or an explicit base.
#[derive(Debug, Clone)]
pub struct NotiPaths {
    base: PathBuf,
}

impl NotiPaths {
    /// Paths under `base`, or under `~/.config/notigenie` when `None`.
    pub fn new(base: Option<&Path>) -> Result<Self> {
        let base = match base {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_dir()?,
        };
        Ok(Self { base })
    }

    /// Paths rooted at the directory containing `config_file`.
    pub fn from_config_file(config_file: &Path) -> Result<Self> {
        match config_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::new(Some(parent)),
            _ => Self::new(Some(Path::new("."))),
        }
    }

    fn default_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| NotiError::config("Cannot find the user configuration directory"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.base
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn secret_file(&self) -> PathBuf {
        self.base.join("secret.json")
    }

    /// Schema directory: `[schemas] dir` if set, else `<config>/schemas`.
    pub fn schemas_dir(&self, config: &AppConfig) -> PathBuf {
        config
            .schemas
            .dir
            .clone()
            .unwrap_or_else(|| self.base.join("schemas"))
    }

    /// Conversation directory: `[session] data_dir` if set, else `<config>/conversations`.
    pub fn conversations_dir(&self, config: &AppConfig) -> PathBuf {
        config
            .session
            .data_dir
            .clone()
            .unwrap_or_else(|| self.base.join("conversations"))
    }
}
