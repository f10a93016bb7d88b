//! Notion record store over the public REST API.

use async_trait::async_trait;
use notigenie_core::config::NotionConfig;
use notigenie_core::store::RecordStore;
use notigenie_core::{NotiError, Result};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

const PAGE_SIZE: u32 = 100;
/// Upper bound on followed query cursors.
const MAX_QUERY_PAGES: usize = 20;

#[derive(Clone)]
pub struct NotionStore {
    client: Client,
    api_key: String,
    base_url: String,
    api_version: String,
}

impl NotionStore {
    pub fn new(api_key: impl Into<String>, config: &NotionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotiError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%method, path, "Notion request");

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.api_version);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotiError::remote(format!("Unexpected Error: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NotiError::remote(format!("Unexpected Error: {e}")))?;

        if !status.is_success() {
            return Err(map_api_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| NotiError::remote(format!("Unexpected Error: invalid response body: {e}")))
    }
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<String>,
    message: Option<String>,
}

/// Converts an error response into `Remote { message, code }`.
fn map_api_error(status: u16, body: &str) -> NotiError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            code: Some(code),
            message,
        }) => NotiError::remote_with_code(
            format!(
                "Notion API Error: {}",
                message.unwrap_or_else(|| format!("HTTP {status}"))
            ),
            code,
        ),
        _ => NotiError::remote_with_code(
            format!("Notion API Error: HTTP {status}"),
            status.to_string(),
        ),
    }
}

fn query_body(filter: Option<&Value>, cursor: Option<&str>) -> Value {
    let mut body = Map::new();
    body.insert("page_size".to_string(), json!(PAGE_SIZE));
    if let Some(filter) = filter {
        body.insert("filter".to_string(), filter.clone());
    }
    if let Some(cursor) = cursor {
        body.insert("start_cursor".to_string(), json!(cursor));
    }
    Value::Object(body)
}

#[derive(Deserialize)]
struct QueryPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[async_trait]
impl RecordStore for NotionStore {
    async fn query_database(&self, database_id: &str, filter: Option<Value>) -> Result<Vec<Value>> {
        let path = format!("databases/{database_id}/query");
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_QUERY_PAGES {
            let body = query_body(filter.as_ref(), cursor.as_deref());
            let raw = self.send(Method::POST, &path, Some(body)).await?;
            let page: QueryPage = serde_json::from_value(raw)
                .map_err(|e| NotiError::remote(format!("Unexpected Error: {e}")))?;

            pages.extend(page.results);
            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => return Ok(pages),
            }
        }

        warn!(database_id, count = pages.len(), "Query truncated after page limit");
        Ok(pages)
    }

    async fn create_page(&self, database_id: &str, properties: Map<String, Value>) -> Result<Value> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        self.send(Method::POST, "pages", Some(body)).await
    }

    async fn update_page(&self, page_id: &str, properties: Map<String, Value>) -> Result<Value> {
        let body = json!({ "properties": properties });
        self.send(Method::PATCH, &format!("pages/{page_id}"), Some(body))
            .await
    }

    async fn append_children(&self, block_id: &str, children: Vec<Value>) -> Result<Value> {
        let body = json!({ "children": children });
        self.send(
            Method::PATCH,
            &format!("blocks/{block_id}/children"),
            Some(body),
        )
        .await
    }

    async fn validate_connection(&self) -> Result<()> {
        match self.send(Method::GET, "users/me", None).await {
            Ok(me) => {
                let name = me.get("name").and_then(Value::as_str).unwrap_or("unknown");
                info!(bot = name, "Notion API connection verified");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Notion API connection failed");
                Err(e)
            }
        }
    }
}
