//! Database Selector use case.

use crate::prompts::PromptSet;
use notigenie_core::Result;
use notigenie_core::conversation::Turn;
use notigenie_core::llm::{ChatContent, FunctionDeclaration, GenerationRequest, LanguageModel, ToolMode};
use notigenie_core::schema::SchemaRegistry;
use serde_json::{Value, json};
use std::sync::Arc;

/// Name of the single callable the selector exposes.
pub const SELECT_DATABASES: &str = "select_databases";

/// Chooses which logical databases an utterance concerns.
pub struct DatabaseSelector {
    llm: Arc<dyn LanguageModel>,
    registry: Arc<SchemaRegistry>,
    prompts: Arc<PromptSet>,
}

impl DatabaseSelector {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        registry: Arc<SchemaRegistry>,
        prompts: Arc<PromptSet>,
    ) -> Self {
        Self {
            llm,
            registry,
            prompts,
        }
    }

    /// Asks the model for the databases relevant to `utterance`.
    ///
    /// # Returns
    ///
    /// - `Ok(names)`: Selected logical names in the model's order, without
    ///   duplicates. Empty means no database work was requested.
    /// - `Err(_)`: The model call itself failed
    ///
    /// Names are not filtered against the registry here; the synthesis stage
    /// ignores anything unregistered.
    pub async fn select(
        &self,
        utterance: &str,
        current_date: &str,
        history: &[Turn],
    ) -> Result<Vec<String>> {
        if self.registry.is_empty() {
            tracing::debug!("No schemas registered; skipping database selection");
            return Ok(Vec::new());
        }

        let summaries: Vec<String> = self.registry.iter().map(|s| s.summary_line()).collect();
        let instruction = self.prompts.render_selection(&summaries, current_date)?;

        let mut contents = ChatContent::from_history(history);
        contents.push(ChatContent::user(utterance));

        let request = GenerationRequest::new(contents)
            .with_system_instruction(instruction)
            .with_tools(
                vec![self.declaration()],
                ToolMode::Any(vec![SELECT_DATABASES.to_string()]),
            );

        let generation = self.llm.generate(request).await?;

        let Some(call) = generation
            .function_calls
            .iter()
            .find(|c| c.name == SELECT_DATABASES)
        else {
            tracing::debug!("Model answered without selecting databases");
            return Ok(Vec::new());
        };

        let names = parse_names(call.args.get("db_names"));
        tracing::info!(databases = ?names, "Selected databases");
        Ok(names)
    }

    fn declaration(&self) -> FunctionDeclaration {
        let names: Vec<&str> = self.registry.names().collect();
        FunctionDeclaration::new(
            SELECT_DATABASES,
            "Select the databases needed to handle the user's latest message.",
            json!({
                "type": "object",
                "properties": {
                    "db_names": {
                        "type": "array",
                        "description": "Logical names of the relevant databases; empty when none is needed.",
                        "items": { "type": "string", "enum": names }
                    }
                },
                "required": ["db_names"]
            }),
        )
    }
}

/// Reads the selected names, tolerating a bare string or blank entries.
fn parse_names(raw: Option<&Value>) -> Vec<String> {
    let candidates: Vec<&str> = match raw {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(single)) => vec![single.as_str()],
        Some(other) => {
            tracing::warn!(value = %other, "Unexpected db_names shape; selecting nothing");
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut names: Vec<String> = Vec::new();
    for name in candidates.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_dedupes_in_order() {
        let raw = json!(["todo_list", " shopping_list ", "todo_list", ""]);
        assert_eq!(parse_names(Some(&raw)), vec!["todo_list", "shopping_list"]);
    }

    #[test]
    fn test_parse_names_accepts_single_string() {
        assert_eq!(parse_names(Some(&json!("todo_list"))), vec!["todo_list"]);
        assert!(parse_names(Some(&json!(42))).is_empty());
        assert!(parse_names(None).is_empty());
    }
}
