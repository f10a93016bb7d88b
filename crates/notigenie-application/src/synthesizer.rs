//! Operation Synthesizer use case.
//!
//! Scopes the model to one schema at a time and restricts it to the fixed
//! search/create/update/append vocabulary. Property names are not checked
//! here; the formatter validates them against the schema.

use crate::prompts::PromptSet;
use notigenie_core::conversation::Turn;
use notigenie_core::formatter::OperationFormatter;
use notigenie_core::llm::{
    ChatContent, ChatRole, ContentPart, FunctionCall, FunctionDeclaration, GenerationRequest,
    LanguageModel, ToolMode,
};
use notigenie_core::operation::{Operation, OperationKind, OperationRequest, OperationResult};
use notigenie_core::schema::SchemaEntry;
use notigenie_core::{NotiError, Result};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

/// Per-request inputs shared by every schema-scoped synthesis call.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub utterance: &'a str,
    pub current_date: &'a str,
    pub history: &'a [Turn],
    pub research_notes: Option<&'a str>,
}

/// What synthesis produced for one schema.
///
/// Rejected calls are already failed results; they are reported alongside
/// the executed ones and never reach the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisOutcome {
    pub requests: Vec<OperationRequest>,
    pub rejected: Vec<OperationResult>,
}

pub struct OperationSynthesizer {
    llm: Arc<dyn LanguageModel>,
    formatter: Arc<OperationFormatter>,
    prompts: Arc<PromptSet>,
    max_attempts: u32,
}

impl OperationSynthesizer {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        formatter: Arc<OperationFormatter>,
        prompts: Arc<PromptSet>,
        max_attempts: u32,
    ) -> Self {
        Self {
            llm,
            formatter,
            prompts,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Produces the operation requests for one schema.
    ///
    /// Every request carries `database_name`; requests that omit it are
    /// stamped with `schema.name`. While attempts remain, a batch with any
    /// unusable call is sent back with the model's calls and the problems.
    /// On the last attempt the usable calls go through and the rest come
    /// back as rejected results.
    ///
    /// # Returns
    ///
    /// - `Ok(outcome)`: Shape-validated requests plus rejected calls, possibly both empty
    /// - `Err(Parse)`: Every attempt produced an unreadable answer
    /// - `Err(_)`: The model call failed
    pub async fn synthesize(
        &self,
        ctx: SynthesisContext<'_>,
        schema: &SchemaEntry,
    ) -> Result<SynthesisOutcome> {
        let title_property = self.formatter.resolve_title_property(&schema.name);
        let instruction = self.prompts.render_synthesis(
            schema,
            &title_property,
            ctx.current_date,
            ctx.research_notes,
        )?;

        let mut contents = ChatContent::from_history(ctx.history);
        contents.push(ChatContent::user(ctx.utterance));

        let mut attempt = 1;
        loop {
            let request = GenerationRequest::new(contents.clone())
                .with_system_instruction(instruction.clone())
                .with_tools(declarations(), ToolMode::Auto);

            let generation = match self.llm.generate(request).await {
                Ok(generation) => generation,
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        database = %schema.name,
                        attempt,
                        error = %e,
                        "Unreadable synthesis answer; retrying"
                    );
                    contents.push(feedback_turn(&e.to_string()));
                    attempt += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        database = %schema.name,
                        attempt,
                        error = %e,
                        "Giving up on operation synthesis"
                    );
                    return Err(NotiError::parse(format!(
                        "no valid operations after {} attempt(s): {}",
                        attempt, e
                    )));
                }
            };

            let batch = Batch::from_calls(&generation.function_calls, &schema.name);
            if batch.rejected.is_empty() || attempt >= self.max_attempts {
                if !batch.rejected.is_empty() {
                    tracing::warn!(
                        database = %schema.name,
                        attempt,
                        rejected = batch.rejected.len(),
                        "Giving up on malformed calls; running the rest"
                    );
                }
                tracing::info!(
                    database = %schema.name,
                    attempt,
                    operations = batch.requests.len(),
                    "Synthesized operations"
                );
                return Ok(batch.into_outcome(&schema.name));
            }

            tracing::warn!(
                database = %schema.name,
                attempt,
                rejected = batch.rejected.len(),
                "Synthesized operations were malformed; retrying"
            );
            contents.push(ChatContent {
                role: ChatRole::Model,
                parts: generation
                    .function_calls
                    .iter()
                    .cloned()
                    .map(ContentPart::FunctionCall)
                    .collect(),
            });
            contents.push(feedback_turn(&batch.problems()));
            attempt += 1;
        }
    }
}

/// Malformed answers are worth another attempt; transport failures are not.
fn is_retryable(error: &NotiError) -> bool {
    error.is_parse() || matches!(error, NotiError::InvalidArguments(_))
}

fn feedback_turn(problems: &str) -> ChatContent {
    ChatContent::user(format!(
        "Your previous function call could not be used: {}. \
         Call the functions again with corrected arguments.",
        problems
    ))
}

/// The model's calls split into usable requests and rejected calls.
struct Batch {
    requests: Vec<OperationRequest>,
    rejected: Vec<(FunctionCall, NotiError)>,
}

impl Batch {
    fn from_calls(calls: &[FunctionCall], schema_name: &str) -> Self {
        let mut batch = Self {
            requests: Vec::new(),
            rejected: Vec::new(),
        };
        for call in calls {
            match to_request(call, schema_name) {
                Ok(request) => batch.requests.push(request),
                Err(e) => batch.rejected.push((call.clone(), e)),
            }
        }
        batch
    }

    fn problems(&self) -> String {
        self.rejected
            .iter()
            .map(|(_, e)| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn into_outcome(self, schema_name: &str) -> SynthesisOutcome {
        let rejected = self
            .rejected
            .into_iter()
            .map(|(call, e)| {
                OperationResult::from_error(call.name, Some(schema_name.to_string()), call.args, &e)
            })
            .collect();
        SynthesisOutcome {
            requests: self.requests,
            rejected,
        }
    }
}

/// Converts and validates one of the model's calls.
fn to_request(call: &FunctionCall, schema_name: &str) -> Result<OperationRequest> {
    let kind = OperationKind::from_str(&call.name)
        .map_err(|_| NotiError::invalid_arguments(format!("unknown function {}", call.name)))?;
    let request = OperationRequest::new(kind, call.args.clone()).scope_to(schema_name);
    Operation::try_from(&request)?;
    Ok(request)
}

/// The four callables; shapes are fixed and schema-independent.
///
/// Object-valued arguments are declared as JSON strings since the model API
/// rejects free-form objects; the formatter parses them.
fn declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration::new(
            OperationKind::Search.as_ref(),
            "Search pages of the database. Without arguments it lists every page.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Text contained in the page title."
                    },
                    "filter_conditions": {
                        "type": "string",
                        "description": "JSON object of property name to required value, e.g. {\"Done\": false}."
                    }
                }
            }),
        ),
        FunctionDeclaration::new(
            OperationKind::Create.as_ref(),
            "Create a new page.",
            json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Title of the new page."
                    },
                    "properties": {
                        "type": "string",
                        "description": "JSON object of property name to value."
                    }
                },
                "required": ["title"]
            }),
        ),
        FunctionDeclaration::new(
            OperationKind::Update.as_ref(),
            "Update properties of an existing page.",
            json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Id of the page to update."
                    },
                    "properties": {
                        "type": "string",
                        "description": "JSON object of property name to new value."
                    }
                },
                "required": ["id", "properties"]
            }),
        ),
        FunctionDeclaration::new(
            OperationKind::Append.as_ref(),
            "Append text blocks to the body of an existing page.",
            json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Id of the page to append to."
                    },
                    "children": {
                        "type": "array",
                        "description": "Paragraphs to append, one string each.",
                        "items": { "type": "string" }
                    }
                },
                "required": ["id", "children"]
            }),
        ),
    ]
}
