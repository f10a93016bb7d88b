//! Tool Executor use case.

use notigenie_core::formatter::{OperationFormatter, flatten_page, normalize_children};
use notigenie_core::operation::{
    AppendArgs, CreateArgs, Operation, OperationRequest, OperationResult, SearchArgs, UpdateArgs,
};
use notigenie_core::store::RecordStore;
use notigenie_core::{NotiError, Result};
use serde_json::{Value, json};
use std::sync::Arc;

/// Executes formatted operations against the record store.
///
/// Stateless per call. Every failure, from name resolution to the remote
/// call, comes back as a failed [`OperationResult`] so sibling operations of
/// the same request are never aborted.
pub struct ToolExecutor {
    formatter: Arc<OperationFormatter>,
    store: Arc<dyn RecordStore>,
}

impl ToolExecutor {
    pub fn new(formatter: Arc<OperationFormatter>, store: Arc<dyn RecordStore>) -> Self {
        Self { formatter, store }
    }

    pub async fn execute(&self, request: &OperationRequest) -> OperationResult {
        let database_name = request.database_name().map(str::to_string);
        let outcome = match Operation::try_from(request) {
            Ok(operation) => self.run(operation).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(payload) => {
                tracing::info!(
                    operation = %request.kind,
                    database = database_name.as_deref().unwrap_or("-"),
                    "Operation succeeded"
                );
                OperationResult::success(
                    request.kind.to_string(),
                    database_name,
                    request.arguments.clone(),
                    payload,
                )
            }
            Err(e) => {
                tracing::warn!(
                    operation = %request.kind,
                    database = database_name.as_deref().unwrap_or("-"),
                    error = %e,
                    "Operation failed"
                );
                OperationResult::from_error(
                    request.kind.to_string(),
                    database_name,
                    request.arguments.clone(),
                    &e,
                )
            }
        }
    }

    async fn run(&self, operation: Operation) -> Result<Value> {
        match operation {
            Operation::Search(args) => self.search(args).await,
            Operation::Create(args) => self.create(args).await,
            Operation::Update(args) => self.update(args).await,
            Operation::Append(args) => self.append(args).await,
        }
    }

    async fn search(&self, args: SearchArgs) -> Result<Value> {
        let database_id = self.formatter.resolve_database_id(&args.database_name)?;
        let filter = self.formatter.format_filter(
            &args.database_name,
            args.filter_conditions.as_ref(),
            args.title_query(),
        );
        tracing::debug!(database = %args.database_name, filter = ?filter, "Querying database");

        let pages = self.store.query_database(&database_id, filter).await?;
        let results: Vec<Value> = pages.iter().map(|p| flatten_page(p).to_value()).collect();
        Ok(json!({ "count": results.len(), "results": results }))
    }

    async fn create(&self, args: CreateArgs) -> Result<Value> {
        let database_id = self.formatter.resolve_database_id(&args.database_name)?;
        let properties = self.formatter.format_create_properties(
            &args.database_name,
            &args.title,
            args.properties.as_ref(),
        );
        let page = self.store.create_page(&database_id, properties).await?;
        Ok(flatten_page(&page).to_value())
    }

    async fn update(&self, args: UpdateArgs) -> Result<Value> {
        // Unknown schemas are rejected before any property resolution.
        self.formatter.resolve_database_id(&args.database_name)?;
        let page_id = self.formatter.normalize_record_id(&args.id)?;
        let properties = self
            .formatter
            .format_properties(&args.database_name, args.properties.as_ref());
        if properties.is_empty() {
            return Err(NotiError::invalid_arguments("update: no properties to change"));
        }
        let page = self.store.update_page(&page_id, properties).await?;
        Ok(flatten_page(&page).to_value())
    }

    async fn append(&self, args: AppendArgs) -> Result<Value> {
        if let Some(name) = args.database_name.as_deref().filter(|n| !n.trim().is_empty()) {
            self.formatter.resolve_database_id(name)?;
        }
        let block_id = self.formatter.normalize_record_id(&args.id)?;
        let children = normalize_children(&args.children);
        if children.is_empty() {
            return Err(NotiError::invalid_arguments("append: no content to append"));
        }
        let response = self.store.append_children(&block_id, children).await?;
        let results_count = response
            .get("results")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        Ok(json!({ "status": "success", "results_count": results_count }))
    }
}
