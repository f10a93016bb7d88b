//! Configuration model.
//!
//! Mirrors `config.toml` section by section. Every field has a default, so a
//! missing file or a partial file yields a working configuration.

use crate::error::{NotiError, Result};
use crate::formatter::DEFAULT_TITLE_PROPERTY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{AsRefStr, Display, EnumString};

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub schemas: SchemaConfig,
    pub formatter: FormatterConfig,
    pub llm: LlmConfig,
    pub notion: NotionConfig,
    pub pipeline: PipelineConfig,
    pub prompts: PromptConfig,
    pub digest: DigestConfig,
}

impl AppConfig {
    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.session.history_limit_minutes == 0 {
            return Err(NotiError::config("session.history_limit_minutes must be at least 1"));
        }
        if self.session.max_history_length == 0 {
            return Err(NotiError::config("session.max_history_length must be at least 1"));
        }
        if self.formatter.default_title_property.trim().is_empty() {
            return Err(NotiError::config("formatter.default_title_property must not be empty"));
        }
        if self.pipeline.synthesis_max_attempts == 0 {
            return Err(NotiError::config("pipeline.synthesis_max_attempts must be at least 1"));
        }
        if self.pipeline.reply_deadline_secs == Some(0) {
            return Err(NotiError::config("pipeline.reply_deadline_secs must be positive"));
        }
        if !(-12..=14).contains(&self.pipeline.timezone_offset_hours) {
            return Err(NotiError::config(format!(
                "pipeline.timezone_offset_hours out of range: {}",
                self.pipeline.timezone_offset_hours
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(NotiError::config("llm.model must not be empty"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(NotiError::config("llm.timeout_secs must be positive"));
        }
        if self.notion.timeout_secs == 0 {
            return Err(NotiError::config("notion.timeout_secs must be positive"));
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub history_limit_minutes: u32,
    pub max_history_length: usize,
    /// Conversation documents directory; defaults under the config dir.
    pub data_dir: Option<PathBuf>,
    pub backend: SessionBackend,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit_minutes: 5,
            max_history_length: 40,
            data_dir: None,
            backend: SessionBackend::File,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory of `<logical_name>.json` schema documents.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub default_title_property: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            default_title_property: DEFAULT_TITLE_PROPERTY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-lite".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub base_url: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.notion.com/v1".to_string(),
            api_version: "2022-06-28".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Hard reply deadline imposed by the delivery channel, if any.
    pub reply_deadline_secs: Option<u64>,
    pub synthesis_max_attempts: u32,
    /// Ask the model for grounded research notes before synthesis.
    pub research: bool,
    /// Offset from UTC used to compute the current date.
    pub timezone_offset_hours: i32,
    pub apology_reply: String,
    pub fallback_reply: String,
    pub timeout_reply: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reply_deadline_secs: None,
            synthesis_max_attempts: 2,
            research: false,
            timezone_offset_hours: 9,
            apology_reply: "Sorry, something went wrong while handling your request.".to_string(),
            fallback_reply: "Sorry, I could not come up with an answer.".to_string(),
            timeout_reply: "Sorry, that took too long. Please try again.".to_string(),
        }
    }
}

/// Optional overrides for the built-in prompt templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub selection: Option<String>,
    pub synthesis: Option<String>,
    pub composition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Logical database to digest; the first registered one when absent.
    pub database: String,
    pub done_property: String,
    pub status_property: String,
    pub done_statuses: Vec<String>,
    pub deadline_property: String,
    pub display_date_property: String,
    pub memo_property: String,
    pub done_date_property: String,
    pub recent_days: u32,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            database: "todo_list".to_string(),
            done_property: "Done".to_string(),
            status_property: "Status".to_string(),
            done_statuses: ["Done", "Completed", "Archived", "完了"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            deadline_property: "Deadline".to_string(),
            display_date_property: "DisplayDate".to_string(),
            memo_property: "Memo".to_string(),
            done_date_property: "DoneDate".to_string(),
            recent_days: 3,
        }
    }
}

/// Root of `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<ApiKeyConfig>,
    #[serde(default)]
    pub notion: Option<ApiKeyConfig>,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub api_key: String,
}

impl std::fmt::Debug for ApiKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyConfig")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl SecretConfig {
    pub fn gemini_key(&self) -> Option<&str> {
        self.gemini
            .as_ref()
            .map(|c| c.api_key.as_str())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn notion_key(&self) -> Option<&str> {
        self.notion
            .as_ref()
            .map(|c| c.api_key.as_str())
            .filter(|k| !k.trim().is_empty())
    }
}
