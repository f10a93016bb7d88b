//! Secret service implementation.
//!
//! Loads API keys from `secret.json`; the `GEMINI_API_KEY` and
//! `NOTION_API_KEY` environment variables take precedence.

use async_trait::async_trait;
use notigenie_core::config::{ApiKeyConfig, SecretConfig};
use notigenie_core::secret::SecretService;
use notigenie_core::{NotiError, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const NOTION_API_KEY_ENV: &str = "NOTION_API_KEY";

/// Environment lookup, injectable for tests.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub struct SecretServiceImpl {
    path: PathBuf,
    env: EnvLookup,
}

impl SecretServiceImpl {
    pub fn new(path: PathBuf) -> Self {
        Self::with_env(path, Arc::new(|key: &str| std::env::var(key).ok()))
    }

    pub fn with_env(path: PathBuf, env: EnvLookup) -> Self {
        Self { path, env }
    }

    fn read_file(&self) -> Result<SecretConfig> {
        if !self.path.exists() {
            return Ok(SecretConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SecretConfig::default());
        }
        // The parse error may quote file content, so it is not forwarded.
        serde_json::from_str(&content).map_err(|_| {
            NotiError::config(format!("Failed to parse {}", self.path.display()))
        })
    }

    fn env_key(&self, name: &str) -> Option<ApiKeyConfig> {
        (self.env)(name)
            .filter(|value| !value.trim().is_empty())
            .map(|api_key| ApiKeyConfig { api_key })
    }
}

#[async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        let mut secrets = self.read_file()?;
        if let Some(key) = self.env_key(GEMINI_API_KEY_ENV) {
            secrets.gemini = Some(key);
        }
        if let Some(key) = self.env_key(NOTION_API_KEY_ENV) {
            secrets.notion = Some(key);
        }
        Ok(secrets)
    }

    async fn secret_file_exists(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env() -> EnvLookup {
        Arc::new(|_: &str| None)
    }

    #[tokio::test]
    async fn test_reads_secret_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(
            &path,
            r#"{"gemini": {"api_key": "g-file"}, "notion": {"api_key": "n-file"}}"#,
        )
        .unwrap();

        let service = SecretServiceImpl::with_env(path, no_env());
        let secrets = service.load_secrets().await.unwrap();
        assert_eq!(secrets.gemini_key(), Some("g-file"));
        assert_eq!(secrets.notion_key(), Some("n-file"));
        assert!(service.secret_file_exists().await);
    }

    #[tokio::test]
    async fn test_environment_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(&path, r#"{"gemini": {"api_key": "g-file"}}"#).unwrap();

        let env: EnvLookup = Arc::new(|key: &str| match key {
            GEMINI_API_KEY_ENV => Some("g-env".to_string()),
            NOTION_API_KEY_ENV => Some("  ".to_string()),
            _ => None,
        });
        let secrets = SecretServiceImpl::with_env(path, env)
            .load_secrets()
            .await
            .unwrap();
        assert_eq!(secrets.gemini_key(), Some("g-env"));
        assert_eq!(secrets.notion_key(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let service = SecretServiceImpl::with_env(temp_dir.path().join("secret.json"), no_env());
        assert_eq!(service.load_secrets().await.unwrap(), SecretConfig::default());
        assert!(!service.secret_file_exists().await);
    }
}
