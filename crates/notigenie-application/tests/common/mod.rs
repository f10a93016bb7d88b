//! Shared fixtures: a scripted language model, a recording record store and
//! a two-database registry.

#![allow(dead_code)]

use async_trait::async_trait;
use notigenie_application::{Orchestrator, PipelineComponents};
use notigenie_core::config::AppConfig;
use notigenie_core::llm::{
    ChatRole, ContentPart, FunctionCall, Generation, GenerationRequest, LanguageModel,
};
use notigenie_core::schema::{PropertyDefinition, PropertyType, SchemaEntry, SchemaRegistry};
use notigenie_core::store::RecordStore;
use notigenie_core::{NotiError, Result};
use notigenie_infrastructure::MemorySessionStore;
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SHOPPING_ID: &str = "1ff1ac9c8c708098bf4ac641178c9b8d";
pub const SHOPPING_ID_DASHED: &str = "1ff1ac9c-8c70-8098-bf4a-c641178c9b8d";
pub const TODO_ID: &str = "1429989fe8ac4effbc8f57f56486db54";
pub const TODO_ID_DASHED: &str = "1429989f-e8ac-4eff-bc8f-57f56486db54";
pub const PAGE_ID: &str = "8f5a3c1e-2b4d-4e6f-8a9b-0c1d2e3f4a5b";

pub fn registry() -> Arc<SchemaRegistry> {
    let shopping = SchemaEntry::new("shopping_list", SHOPPING_ID)
        .with_title("Shopping list")
        .with_description("Things to buy")
        .with_property(PropertyDefinition::new("Name", PropertyType::Title))
        .with_property(PropertyDefinition::new("Done", PropertyType::Checkbox));
    let todo = SchemaEntry::new("todo_list", TODO_ID)
        .with_title("Todo")
        .with_description("Tasks with deadlines")
        .with_property(PropertyDefinition::new("Name", PropertyType::Title))
        .with_property(PropertyDefinition::new("Done", PropertyType::Checkbox))
        .with_property(
            PropertyDefinition::new("Status", PropertyType::Status)
                .with_options(["Not started", "In progress", "Done"]),
        )
        .with_property(PropertyDefinition::new("Deadline", PropertyType::Date))
        .with_property(PropertyDefinition::new("Memo", PropertyType::RichText));
    Arc::new(SchemaRegistry::from_entries([shopping, todo]))
}

/// Pipeline stage a generation request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Select,
    Synthesize,
    Compose,
}

pub fn stage_of(request: &GenerationRequest) -> Stage {
    if request.tools.iter().any(|t| t.name == "select_databases") {
        Stage::Select
    } else if request.tools.is_empty() {
        Stage::Compose
    } else {
        Stage::Synthesize
    }
}

/// Logical database a synthesis request is scoped to.
pub fn scoped_database(request: &GenerationRequest) -> Option<String> {
    let instruction = request.system_instruction.as_deref()?;
    let start = instruction.find("database \"")? + "database \"".len();
    let end = instruction[start..].find('"')?;
    Some(instruction[start..start + end].to_string())
}

/// Function responses carried by a composition request.
pub fn function_responses(request: &GenerationRequest) -> Vec<Value> {
    request
        .contents
        .iter()
        .filter(|c| c.role == ChatRole::Function)
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| match p {
            ContentPart::FunctionResponse { response, .. } => Some(response.clone()),
            _ => None,
        })
        .collect()
}

pub fn call(name: &str, args: Value) -> FunctionCall {
    let Value::Object(map) = args else {
        panic!("arguments must be an object")
    };
    FunctionCall::new(name, map)
}

pub fn select(names: &[&str]) -> Generation {
    Generation::from_calls(vec![call("select_databases", json!({ "db_names": names }))])
}

type Responder = Box<dyn Fn(&GenerationRequest) -> Result<Generation> + Send + Sync>;

/// Language model scripted per stage, recording every request.
pub struct MockLanguageModel {
    select: Responder,
    synthesize: Responder,
    compose: Responder,
    delay: Option<Duration>,
    research: Option<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            select: Box::new(|_| Ok(select(&[]))),
            synthesize: Box::new(|_| Ok(Generation::default())),
            compose: Box::new(|_| Ok(Generation::from_text("ok"))),
            delay: None,
            research: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn on_select(
        mut self,
        f: impl Fn(&GenerationRequest) -> Result<Generation> + Send + Sync + 'static,
    ) -> Self {
        self.select = Box::new(f);
        self
    }

    pub fn on_synthesize(
        mut self,
        f: impl Fn(&GenerationRequest) -> Result<Generation> + Send + Sync + 'static,
    ) -> Self {
        self.synthesize = Box::new(f);
        self
    }

    pub fn on_compose(
        mut self,
        f: impl Fn(&GenerationRequest) -> Result<Generation> + Send + Sync + 'static,
    ) -> Self {
        self.compose = Box::new(f);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_research(mut self, notes: &str) -> Self {
        self.research = Some(notes.to_string());
        self
    }

    pub fn requests(&self, stage: Stage) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| stage_of(r) == stage)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests.lock().unwrap().push(request.clone());
        match stage_of(&request) {
            Stage::Select => (self.select)(&request),
            Stage::Synthesize => (self.synthesize)(&request),
            Stage::Compose => (self.compose)(&request),
        }
    }

    async fn research(&self, _utterance: &str, _current_date: &str) -> Result<Option<String>> {
        Ok(self.research.clone())
    }
}

/// One call received by the recording store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Query {
        database_id: String,
        filter: Option<Value>,
    },
    Create {
        database_id: String,
        properties: Map<String, Value>,
    },
    Update {
        page_id: String,
        properties: Map<String, Value>,
    },
    Append {
        block_id: String,
        children: Vec<Value>,
    },
}

/// Record store that remembers calls and answers with canned pages.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    failing_database: Option<String>,
    pages: Vec<Value>,
    created: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries against this database id fail with a remote error.
    pub fn failing_on(mut self, database_id: &str) -> Self {
        self.failing_database = Some(database_id.to_string());
        self
    }

    pub fn with_pages(mut self, pages: Vec<Value>) -> Self {
        self.pages = pages;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    fn fail_if_configured(&self, database_id: &str) -> Result<()> {
        if self.failing_database.as_deref() == Some(database_id) {
            return Err(NotiError::remote_with_code(
                "Notion API Error: service unavailable",
                "service_unavailable",
            ));
        }
        Ok(())
    }
}

pub fn page(id: &str, title: &str, extra: Value) -> Value {
    let mut properties = json!({
        "Name": { "type": "title", "title": [{ "plain_text": title }] }
    });
    if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        target.extend(extra);
    }
    json!({
        "id": id,
        "url": format!("https://www.notion.so/{}", id.replace('-', "")),
        "properties": properties,
    })
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn query_database(&self, database_id: &str, filter: Option<Value>) -> Result<Vec<Value>> {
        self.calls.lock().unwrap().push(StoreCall::Query {
            database_id: database_id.to_string(),
            filter,
        });
        self.fail_if_configured(database_id)?;
        Ok(self.pages.clone())
    }

    async fn create_page(&self, database_id: &str, properties: Map<String, Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(StoreCall::Create {
            database_id: database_id.to_string(),
            properties: properties.clone(),
        });
        self.fail_if_configured(database_id)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "id": PAGE_ID,
            "url": "https://www.notion.so/page",
            "properties": properties,
        }))
    }

    async fn update_page(&self, page_id: &str, properties: Map<String, Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(StoreCall::Update {
            page_id: page_id.to_string(),
            properties: properties.clone(),
        });
        Ok(json!({ "id": page_id, "properties": properties }))
    }

    async fn append_children(&self, block_id: &str, children: Vec<Value>) -> Result<Value> {
        let count = children.len();
        self.calls.lock().unwrap().push(StoreCall::Append {
            block_id: block_id.to_string(),
            children,
        });
        Ok(json!({ "object": "list", "results": vec![json!({}); count] }))
    }

    async fn validate_connection(&self) -> Result<()> {
        Ok(())
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub llm: Arc<MockLanguageModel>,
    pub store: Arc<RecordingStore>,
}

pub fn harness(llm: MockLanguageModel, store: RecordingStore, config: AppConfig) -> Harness {
    let llm = Arc::new(llm);
    let store = Arc::new(store);
    let components = PipelineComponents::assemble(
        llm.clone(),
        store.clone(),
        Arc::new(MemorySessionStore::new()),
        registry(),
        &config,
    )
    .unwrap();
    Harness {
        orchestrator: Orchestrator::new(components, config.pipeline.clone()),
        llm,
        store,
    }
}
