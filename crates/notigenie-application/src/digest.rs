//! Todo digest: open items by deadline plus recently finished ones.

use chrono::{Days, NaiveDate};
use notigenie_core::config::DigestConfig;
use notigenie_core::formatter::{OperationFormatter, PageSummary, flatten_page};
use notigenie_core::store::RecordStore;
use notigenie_core::{NotiError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestItem {
    pub name: String,
    pub deadline: Option<String>,
    pub display_date: Option<String>,
    pub memo: Option<String>,
    pub done_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestReport {
    pub query_date: String,
    pub todos: Vec<DigestItem>,
    pub dones: Vec<DigestItem>,
}

pub struct TodoDigest {
    formatter: Arc<OperationFormatter>,
    store: Arc<dyn RecordStore>,
    config: DigestConfig,
}

impl TodoDigest {
    pub fn new(
        formatter: Arc<OperationFormatter>,
        store: Arc<dyn RecordStore>,
        config: DigestConfig,
    ) -> Self {
        Self {
            formatter,
            store,
            config,
        }
    }

    /// Logical database the digest reads.
    ///
    /// The configured one when registered, otherwise the first registered.
    pub fn database_name(&self) -> Option<&str> {
        let registry = self.formatter.registry();
        if registry.contains(&self.config.database) {
            Some(self.config.database.as_str())
        } else {
            registry.names().next()
        }
    }

    /// Lists every page of the digest database and classifies it for `today`.
    pub async fn build(&self, today: NaiveDate) -> Result<DigestReport> {
        let name = self
            .database_name()
            .ok_or_else(|| NotiError::not_found("Database", self.config.database.clone()))?;
        if name != self.config.database {
            tracing::info!(
                configured = %self.config.database,
                using = name,
                "Digest database not registered; using fallback"
            );
        }

        let database_id = self.formatter.resolve_database_id(name)?;
        let pages = self.store.query_database(&database_id, None).await?;

        let cutoff = today
            .checked_sub_days(Days::new(u64::from(self.config.recent_days)))
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string();

        let mut todos = Vec::new();
        let mut dones = Vec::new();
        for page in &pages {
            let summary = flatten_page(page);
            if self.is_done(&summary) {
                let done_date = date_of(&summary.properties, &self.config.done_date_property)
                    .or_else(|| last_edited_date(page));
                if done_date.as_deref().is_some_and(|d| d >= cutoff.as_str()) {
                    dones.push(self.item(&summary, done_date));
                }
            } else {
                todos.push(self.item(&summary, None));
            }
        }

        todos.sort_by(|a, b| ascending_missing_last(&a.deadline, &b.deadline));
        dones.sort_by(|a, b| b.done_date.cmp(&a.done_date));

        tracing::info!(
            database = name,
            todos = todos.len(),
            dones = dones.len(),
            "Built todo digest"
        );
        Ok(DigestReport {
            query_date: today.format("%Y-%m-%d").to_string(),
            todos,
            dones,
        })
    }

    fn is_done(&self, summary: &PageSummary) -> bool {
        let props = &summary.properties;
        if props.get(&self.config.done_property).and_then(Value::as_bool) == Some(true) {
            return true;
        }
        props
            .get(&self.config.status_property)
            .and_then(Value::as_str)
            .is_some_and(|status| self.config.done_statuses.iter().any(|s| s == status))
    }

    fn item(&self, summary: &PageSummary, done_date: Option<String>) -> DigestItem {
        DigestItem {
            name: summary.title.clone(),
            deadline: date_of(&summary.properties, &self.config.deadline_property),
            display_date: date_of(&summary.properties, &self.config.display_date_property),
            memo: text_of(&summary.properties, &self.config.memo_property),
            done_date,
        }
    }
}

/// Start date of a flattened date property.
fn date_of(props: &Map<String, Value>, property: &str) -> Option<String> {
    let start = match props.get(property)? {
        Value::String(s) => s.as_str(),
        Value::Object(range) => range.get("start").and_then(Value::as_str)?,
        _ => return None,
    };
    Some(start.to_string()).filter(|s| !s.is_empty())
}

fn text_of(props: &Map<String, Value>, property: &str) -> Option<String> {
    props
        .get(property)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn last_edited_date(page: &Value) -> Option<String> {
    page.get("last_edited_time")
        .and_then(Value::as_str)
        .and_then(|ts| ts.get(..10))
        .map(str::to_string)
}

fn ascending_missing_last(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
