//! NotiGenie application layer.
//!
//! Use cases of the intent-to-operation pipeline, each depending only on
//! the collaborator traits of `notigenie-core`:
//!
//! - `memory`: Conversation Memory over a transactional session store
//! - `selector`: Database Selector
//! - `synthesizer`: Operation Synthesizer with bounded retry
//! - `executor`: Tool Executor
//! - `composer`: Response Composer
//! - `orchestrator`: Per-request sequencing, deadline and apology handling
//! - `digest`: Todo digest over one logical database
//! - `prompts`: minijinja prompt templates

pub mod composer;
pub mod digest;
pub mod executor;
pub mod memory;
pub mod orchestrator;
pub mod prompts;
pub mod selector;
pub mod synthesizer;

pub use composer::ResponseComposer;
pub use digest::{DigestItem, DigestReport, TodoDigest};
pub use executor::ToolExecutor;
pub use memory::{Clock, ConversationMemory};
pub use orchestrator::{Orchestrator, PipelineComponents};
pub use prompts::PromptSet;
pub use selector::{DatabaseSelector, SELECT_DATABASES};
pub use synthesizer::{OperationSynthesizer, SynthesisContext, SynthesisOutcome};
