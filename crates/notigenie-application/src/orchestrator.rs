//! Orchestrator: sequences the pipeline for one request.
//!
//! ```text
//! SelectingDb ─(no dbs)──────────────────────────────────────────┐
//!     └─(n dbs)─> [Synthesizing(db_i) -> Formatting -> Executing]* ─> Composing -> Done
//! ```
//!
//! Databases fan out concurrently, as do the operations of one database.
//! Any failure is caught here and turned into an apology; the exchange is
//! always recorded in conversation memory.

use crate::composer::ResponseComposer;
use crate::executor::ToolExecutor;
use crate::memory::{Clock, ConversationMemory};
use crate::prompts::PromptSet;
use crate::selector::DatabaseSelector;
use crate::synthesizer::{OperationSynthesizer, SynthesisContext};
use chrono::{FixedOffset, Utc};
use futures::future::join_all;
use notigenie_core::config::{AppConfig, PipelineConfig};
use notigenie_core::conversation::{SessionStore, Turn};
use notigenie_core::formatter::OperationFormatter;
use notigenie_core::llm::LanguageModel;
use notigenie_core::operation::{OperationResult, SYNTHESIZE_OPERATION};
use notigenie_core::schema::SchemaRegistry;
use notigenie_core::store::RecordStore;
use notigenie_core::Result;
use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;

/// Collaborators of the orchestrator, built once at startup.
pub struct PipelineComponents {
    pub memory: ConversationMemory,
    pub selector: DatabaseSelector,
    pub synthesizer: OperationSynthesizer,
    pub executor: ToolExecutor,
    pub composer: ResponseComposer,
    pub registry: Arc<SchemaRegistry>,
    pub llm: Arc<dyn LanguageModel>,
}

impl PipelineComponents {
    /// Wires every stage from the shared collaborators and configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` when a prompt override does not compile.
    pub fn assemble(
        llm: Arc<dyn LanguageModel>,
        store: Arc<dyn RecordStore>,
        sessions: Arc<dyn SessionStore>,
        registry: Arc<SchemaRegistry>,
        config: &AppConfig,
    ) -> Result<Self> {
        let prompts = Arc::new(PromptSet::from_config(&config.prompts)?);
        let formatter = Arc::new(OperationFormatter::new(
            registry.clone(),
            config.formatter.default_title_property.clone(),
        ));

        Ok(Self {
            memory: ConversationMemory::new(sessions, &config.session),
            selector: DatabaseSelector::new(llm.clone(), registry.clone(), prompts.clone()),
            synthesizer: OperationSynthesizer::new(
                llm.clone(),
                formatter.clone(),
                prompts.clone(),
                config.pipeline.synthesis_max_attempts,
            ),
            executor: ToolExecutor::new(formatter, store),
            composer: ResponseComposer::new(
                llm.clone(),
                prompts,
                config.pipeline.fallback_reply.clone(),
            ),
            registry,
            llm,
        })
    }
}

pub struct Orchestrator {
    memory: ConversationMemory,
    selector: DatabaseSelector,
    synthesizer: OperationSynthesizer,
    executor: ToolExecutor,
    composer: ResponseComposer,
    registry: Arc<SchemaRegistry>,
    llm: Arc<dyn LanguageModel>,
    config: PipelineConfig,
    clock: Clock,
}

impl Orchestrator {
    pub fn new(components: PipelineComponents, config: PipelineConfig) -> Self {
        Self {
            memory: components.memory,
            selector: components.selector,
            synthesizer: components.synthesizer,
            executor: components.executor,
            composer: components.composer,
            registry: components.registry,
            llm: components.llm,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Today's date in the configured offset, as `YYYY-MM-DD`.
    pub fn current_date(&self) -> String {
        let now = (self.clock)();
        let date = match FixedOffset::east_opt(self.config.timezone_offset_hours * 3600) {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.date_naive(),
        };
        date.format("%Y-%m-%d").to_string()
    }

    /// Handles one utterance dated today.
    pub async fn handle_message(&self, session_id: &str, utterance: &str) -> String {
        let current_date = self.current_date();
        self.handle(session_id, utterance, &current_date).await
    }

    /// Handles one utterance and returns the reply text.
    ///
    /// Never fails: errors and deadline overruns become fixed replies. The
    /// exchange is recorded in memory whatever the outcome.
    pub async fn handle(&self, session_id: &str, utterance: &str, current_date: &str) -> String {
        let history = self.memory.recent_history(session_id).await;
        tracing::info!(session_id, history = history.len(), "Handling request");

        let pipeline = self.run_pipeline(utterance, current_date, &history);
        let reply = match self.config.reply_deadline_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), pipeline).await {
                Ok(outcome) => self.reply_for(session_id, outcome),
                Err(_) => {
                    tracing::warn!(session_id, deadline_secs = secs, "Reply deadline exceeded");
                    self.config.timeout_reply.clone()
                }
            },
            None => self.reply_for(session_id, pipeline.await),
        };

        if let Err(e) = self.memory.add_interaction(session_id, utterance, &reply).await {
            tracing::error!(session_id, error = %e, "Failed to record interaction");
        }
        reply
    }

    fn reply_for(&self, session_id: &str, outcome: Result<String>) -> String {
        outcome.unwrap_or_else(|e| {
            tracing::error!(session_id, error = %e, "Request failed");
            self.config.apology_reply.clone()
        })
    }

    async fn run_pipeline(
        &self,
        utterance: &str,
        current_date: &str,
        history: &[Turn],
    ) -> Result<String> {
        let selected = self.selector.select(utterance, current_date, history).await?;

        let results = if selected.is_empty() {
            Vec::new()
        } else {
            let notes = self.research_notes(utterance, current_date).await;
            let ctx = SynthesisContext {
                utterance,
                current_date,
                history,
                research_notes: notes.as_deref(),
            };

            let known: Vec<&str> = selected
                .iter()
                .map(String::as_str)
                .filter(|name| {
                    let known = self.registry.contains(name);
                    if !known {
                        tracing::warn!(database = %name, "Ignoring unregistered database");
                    }
                    known
                })
                .collect();

            join_all(known.into_iter().map(|name| self.process_database(ctx, name)))
                .await
                .into_iter()
                .flatten()
                .collect()
        };

        Ok(self
            .composer
            .compose(utterance, current_date, &results, history)
            .await)
    }

    /// Synthesizes and executes the operations of one database.
    ///
    /// Rejected calls are reported after the executed ones.
    async fn process_database(&self, ctx: SynthesisContext<'_>, name: &str) -> Vec<OperationResult> {
        let Some(schema) = self.registry.get(name) else {
            return Vec::new();
        };

        match self.synthesizer.synthesize(ctx, schema).await {
            Ok(outcome) => {
                let mut results =
                    join_all(outcome.requests.iter().map(|r| self.executor.execute(r))).await;
                results.extend(outcome.rejected);
                results
            }
            Err(e) => vec![OperationResult::from_error(
                SYNTHESIZE_OPERATION,
                Some(name.to_string()),
                Map::new(),
                &e,
            )],
        }
    }

    async fn research_notes(&self, utterance: &str, current_date: &str) -> Option<String> {
        if !self.config.research {
            return None;
        }
        match self.llm.research(utterance, current_date).await {
            Ok(notes) => notes,
            Err(e) => {
                tracing::warn!(error = %e, "Research failed; continuing without notes");
                None
            }
        }
    }
}

