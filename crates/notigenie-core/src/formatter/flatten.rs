//! Page flattening: the inverse direction of formatting.
//!
//! Turns a raw page object into the compact summary handed to the composer.

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Identifier, url, title and plain property values of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    pub properties: Map<String, Value>,
}

impl PageSummary {
    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "url": self.url,
            "title": self.title,
            "properties": self.properties,
        })
    }
}

/// Flattens a raw page object.
pub fn flatten_page(page: &Value) -> PageSummary {
    let mut title = String::new();
    let mut properties = Map::new();

    if let Some(raw) = page.get("properties").and_then(Value::as_object) {
        for (name, value) in raw {
            if value.get("type").and_then(Value::as_str) == Some("title") {
                title = plain_text(value.get("title"));
            }
            properties.insert(name.clone(), flatten_property(value));
        }
    }

    PageSummary {
        id: string_field(page, "id").unwrap_or_default(),
        url: string_field(page, "url"),
        title,
        properties,
    }
}

/// Plain value of one typed property.
pub fn flatten_property(value: &Value) -> Value {
    let Some(tag) = value.get("type").and_then(Value::as_str) else {
        return Value::Null;
    };
    let inner = value.get(tag).unwrap_or(&Value::Null);

    match tag {
        "title" | "rich_text" => Value::String(plain_text(Some(inner))),
        "select" | "status" => inner.get("name").cloned().unwrap_or(Value::Null),
        "multi_select" => Value::Array(
            inner
                .as_array()
                .map(|items| items.iter().filter_map(|i| i.get("name").cloned()).collect())
                .unwrap_or_default(),
        ),
        "date" => flatten_date(inner),
        "people" => Value::Array(
            inner
                .as_array()
                .map(|items| items.iter().filter_map(|i| i.get("name").cloned()).collect())
                .unwrap_or_default(),
        ),
        "relation" => Value::Array(
            inner
                .as_array()
                .map(|items| items.iter().filter_map(|i| i.get("id").cloned()).collect())
                .unwrap_or_default(),
        ),
        "formula" => flatten_property(inner),
        "unique_id" => match (inner.get("prefix").and_then(Value::as_str), inner.get("number")) {
            (Some(prefix), Some(number)) => Value::String(format!("{prefix}-{number}")),
            (_, Some(number)) => number.clone(),
            _ => Value::Null,
        },
        _ => inner.clone(),
    }
}

fn flatten_date(inner: &Value) -> Value {
    let start = inner.get("start").cloned().unwrap_or(Value::Null);
    match inner.get("end") {
        Some(end) if !end.is_null() => json!({ "start": start, "end": end }),
        _ => start,
    }
}

/// Concatenated plain text of a rich-text array.
pub fn plain_text(runs: Option<&Value>) -> String {
    runs.and_then(Value::as_array)
        .map(|runs| {
            runs.iter()
                .filter_map(|run| {
                    run.get("plain_text")
                        .or_else(|| run.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
