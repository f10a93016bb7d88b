//! Language model collaborator.
//!
//! The pipeline treats the model as a constrained structured-generation
//! function: it sends chat contents plus a fixed set of callable function
//! declarations and reads back either text or function calls.

use crate::conversation::{Role, Turn};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};

/// Author of a chat content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
    /// Carries function responses back to the model.
    Function,
}

impl From<Role> for ChatRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Model => Self::Model,
        }
    }
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentPart {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse { name: String, response: Value },
}

/// One turn of the request sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContent {
    pub role: ChatRole,
    pub parts: Vec<ContentPart>,
}

impl ChatContent {
    pub fn text(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![ContentPart::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(ChatRole::User, text)
    }

    /// Converts stored conversation turns into chat contents, in order.
    pub fn from_history(turns: &[Turn]) -> Vec<Self> {
        turns
            .iter()
            .map(|turn| Self::text(turn.role.into(), turn.content.clone()))
            .collect()
    }
}

/// A callable exposed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the arguments.
    pub parameters: Value,
}

impl FunctionDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// How strictly the model must answer through the declared functions.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolMode {
    /// The model may answer with text or function calls.
    #[default]
    Auto,
    /// The model must call one of the named functions.
    Any(Vec<String>),
    /// Function calling disabled.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub contents: Vec<ChatContent>,
    pub tools: Vec<FunctionDeclaration>,
    pub tool_mode: ToolMode,
}

impl GenerationRequest {
    pub fn new(contents: Vec<ChatContent>) -> Self {
        Self {
            contents,
            ..Self::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<FunctionDeclaration>, mode: ToolMode) -> Self {
        self.tools = tools;
        self.tool_mode = mode;
        self
    }
}

/// The model's answer: free text, function calls, or both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Generation {
    pub text: Option<String>,
    pub function_calls: Vec<FunctionCall>,
}

impl Generation {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_calls: Vec::new(),
        }
    }

    pub fn from_calls(function_calls: Vec<FunctionCall>) -> Self {
        Self {
            text: None,
            function_calls,
        }
    }

    /// Text with surrounding whitespace removed; `None` when blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// The language model collaborator.
///
/// # Implementation Notes
///
/// - Answers that do not fit the requested shape should surface as
///   `NotiError::Parse`, transport failures as `NotiError::Llm`.
/// - Implementations never see the schema registry or the record store.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Runs one generation round-trip.
    ///
    /// # Arguments
    ///
    /// * `request` - System instruction, chat contents and callable functions
    ///
    /// # Returns
    ///
    /// - `Ok(Generation)`: The model answered (text and/or function calls)
    /// - `Err(_)`: The call failed or the answer was malformed
    async fn generate(&self, request: GenerationRequest) -> Result<Generation>;

    /// Gathers grounded research notes for an utterance.
    ///
    /// Models without a grounding tool return `Ok(None)`.
    async fn research(&self, _utterance: &str, _current_date: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
