//! Argument normalization applied once before formatting.
//!
//! The language model is free to send maps as JSON-encoded strings, numbers
//! as strings, and block children as bare text. Everything here turns those
//! shapes into what the builders expect.

use serde_json::{Map, Number, Value, json};
use tracing::warn;

/// Reads an opaque key/value argument as a map.
///
/// Objects pass through, strings are parsed as JSON once; anything that does
/// not yield an object is logged and treated as empty.
pub fn coerce_object(raw: Option<&Value>, field: &str) -> Map<String, Value> {
    match raw {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(text)) if text.trim().is_empty() => Map::new(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(field, kind = value_kind(&other), "Ignoring non-object argument");
                Map::new()
            }
            Err(e) => {
                warn!(field, error = %e, "Ignoring argument with invalid JSON");
                Map::new()
            }
        },
        Some(other) => {
            warn!(field, kind = value_kind(other), "Ignoring non-object argument");
            Map::new()
        }
    }
}

/// Block children for an append: strings become paragraphs, objects pass.
pub fn normalize_children(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(child_block).collect(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ (Value::Array(_) | Value::Object(_))) => normalize_children(&parsed),
            _ => child_block(raw).into_iter().collect(),
        },
        other => child_block(other).into_iter().collect(),
    }
}

fn child_block(item: &Value) -> Option<Value> {
    match item {
        Value::Object(_) => Some(item.clone()),
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(paragraph_block(text)),
        Value::Number(n) => Some(paragraph_block(&n.to_string())),
        _ => None,
    }
}

/// A plain-text paragraph block.
pub fn paragraph_block(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": {
            "rich_text": [{ "type": "text", "text": { "content": text } }]
        }
    })
}

/// Truthiness used for checkbox values.
pub fn coerce_checkbox(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "no" | "off" | "0"
        ),
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// A numeric value, parsing strings. `None` when the value is not numeric.
pub fn coerce_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    }
}

/// Text form of a scalar, for title and rich-text values.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
