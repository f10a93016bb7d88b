//! Property wire-wrapper builders, one per property type.

use super::normalize::{coerce_checkbox, coerce_number, scalar_text};
use crate::schema::PropertyType;
use serde_json::{Value, json};

/// Wraps a raw value; `None` means "leave the value as it is".
pub(crate) type WrapperBuilder = fn(value: &Value) -> Option<Value>;

/// Lookup from declared type to its wrapper builder.
pub(crate) fn wrapper_builder(property_type: &PropertyType) -> WrapperBuilder {
    match property_type {
        PropertyType::Title => title,
        PropertyType::RichText => rich_text,
        PropertyType::Select => select,
        PropertyType::Status => status,
        PropertyType::MultiSelect => multi_select,
        PropertyType::Date => date,
        PropertyType::Checkbox => checkbox,
        PropertyType::Number => number,
        PropertyType::Url => url,
        PropertyType::Unknown(_) => pass_through,
    }
}

/// Whether `value` is already the store's typed wrapper for `tag`.
pub(crate) fn is_wrapped(value: &Value, tag: &str) -> bool {
    value.as_object().is_some_and(|map| map.contains_key(tag))
}

pub(crate) fn title(value: &Value) -> Option<Value> {
    scalar_text(value).map(|text| json!({ "title": text_runs(&text) }))
}

fn rich_text(value: &Value) -> Option<Value> {
    scalar_text(value).map(|text| json!({ "rich_text": text_runs(&text) }))
}

fn text_runs(text: &str) -> Value {
    json!([{ "text": { "content": text } }])
}

fn select(value: &Value) -> Option<Value> {
    value.as_str().map(|name| json!({ "select": { "name": name } }))
}

fn status(value: &Value) -> Option<Value> {
    value.as_str().map(|name| json!({ "status": { "name": name } }))
}

fn multi_select(value: &Value) -> Option<Value> {
    let names: Vec<Value> = match value {
        Value::String(name) => vec![json!({ "name": name })],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|name| json!({ "name": name }))
            .collect(),
        _ => return None,
    };
    Some(json!({ "multi_select": names }))
}

fn date(value: &Value) -> Option<Value> {
    match value {
        Value::String(start) => Some(json!({ "date": { "start": start } })),
        Value::Object(map) if map.contains_key("start") => Some(json!({ "date": value })),
        _ => None,
    }
}

fn checkbox(value: &Value) -> Option<Value> {
    Some(json!({ "checkbox": coerce_checkbox(value) }))
}

fn number(value: &Value) -> Option<Value> {
    coerce_number(value).map(|n| json!({ "number": n }))
}

fn pass_through(_value: &Value) -> Option<Value> {
    None
}

fn url(value: &Value) -> Option<Value> {
    value.as_str().map(|link| json!({ "url": link }))
}
