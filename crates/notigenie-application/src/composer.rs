//! Response Composer use case.

use crate::prompts::PromptSet;
use notigenie_core::conversation::Turn;
use notigenie_core::llm::{
    ChatContent, ChatRole, ContentPart, FunctionCall, GenerationRequest, LanguageModel,
};
use notigenie_core::operation::OperationResult;
use std::sync::Arc;

/// Turns operation results (or none) into the natural-language reply.
pub struct ResponseComposer {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<PromptSet>,
    fallback_reply: String,
}

impl ResponseComposer {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        prompts: Arc<PromptSet>,
        fallback_reply: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            prompts,
            fallback_reply: fallback_reply.into(),
        }
    }

    /// Composes the reply. Never fails and never returns an empty string.
    ///
    /// With results, each one is sent as a function response following the
    /// user's turn; without results the model just converses.
    pub async fn compose(
        &self,
        utterance: &str,
        current_date: &str,
        results: &[OperationResult],
        history: &[Turn],
    ) -> String {
        let instruction = match self
            .prompts
            .render_composition(current_date, !results.is_empty())
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render composition prompt");
                return self.fallback_reply.clone();
            }
        };

        let mut contents = ChatContent::from_history(history);
        contents.push(ChatContent::user(utterance));
        if !results.is_empty() {
            contents.extend(result_turns(results));
        }

        let request = GenerationRequest::new(contents).with_system_instruction(instruction);
        match self.llm.generate(request).await {
            Ok(generation) => match generation.trimmed_text() {
                Some(text) => text.to_string(),
                None => {
                    tracing::warn!("Model returned an empty reply");
                    self.fallback_reply.clone()
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to compose reply");
                self.fallback_reply.clone()
            }
        }
    }
}

/// A model turn with one call per result, then the matching responses.
fn result_turns(results: &[OperationResult]) -> [ChatContent; 2] {
    let calls = results
        .iter()
        .map(|r| ContentPart::FunctionCall(FunctionCall::new(&r.operation, r.arguments.clone())))
        .collect();
    let responses = results
        .iter()
        .map(|r| ContentPart::FunctionResponse {
            name: r.operation.clone(),
            response: r.to_response_value(),
        })
        .collect();

    [
        ChatContent {
            role: ChatRole::Model,
            parts: calls,
        },
        ChatContent {
            role: ChatRole::Function,
            parts: responses,
        },
    ]
}
