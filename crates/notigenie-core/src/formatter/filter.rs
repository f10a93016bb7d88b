//! Filter predicate builders, one per property type.

use super::normalize::{coerce_checkbox, coerce_number};
use crate::schema::PropertyType;
use serde_json::{Value, json};

/// Builds zero or more predicates for one `property = value` condition.
pub(crate) type PredicateBuilder = fn(property: &str, tag: &str, value: &Value) -> Vec<Value>;

/// Lookup from declared type to its predicate builder.
pub(crate) fn predicate_builder(property_type: &PropertyType) -> PredicateBuilder {
    match property_type {
        PropertyType::Checkbox => checkbox_equals,
        PropertyType::Select | PropertyType::Status => equals,
        PropertyType::Date => date_predicate,
        PropertyType::Title | PropertyType::RichText | PropertyType::Url => text_contains,
        PropertyType::MultiSelect => multi_select_contains,
        PropertyType::Number => number_equals,
        PropertyType::Unknown(_) => unknown_contains,
    }
}

/// `combine` folds predicates under AND; a single predicate stays bare.
pub(crate) fn combine(mut predicates: Vec<Value>) -> Option<Value> {
    match predicates.len() {
        0 => None,
        1 => predicates.pop(),
        _ => Some(json!({ "and": predicates })),
    }
}

pub(crate) fn title_contains(property: &str, query: &str) -> Value {
    json!({ "property": property, "title": { "contains": query } })
}

fn predicate(property: &str, tag: &str, condition: Value) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("property".to_string(), Value::String(property.to_string()));
    map.insert(tag.to_string(), condition);
    Value::Object(map)
}

fn equals(property: &str, tag: &str, value: &Value) -> Vec<Value> {
    if value.is_null() {
        return Vec::new();
    }
    vec![predicate(property, tag, json!({ "equals": value }))]
}

fn checkbox_equals(property: &str, tag: &str, value: &Value) -> Vec<Value> {
    if value.is_null() {
        return Vec::new();
    }
    vec![predicate(
        property,
        tag,
        json!({ "equals": coerce_checkbox(value) }),
    )]
}

fn date_predicate(property: &str, tag: &str, value: &Value) -> Vec<Value> {
    match value {
        Value::Object(_) => vec![predicate(property, tag, value.clone())],
        Value::Null => Vec::new(),
        _ => vec![predicate(property, tag, json!({ "equals": value }))],
    }
}

fn text_contains(property: &str, tag: &str, value: &Value) -> Vec<Value> {
    match value {
        Value::String(text) => vec![predicate(property, tag, json!({ "contains": text }))],
        _ => Vec::new(),
    }
}

fn multi_select_contains(property: &str, tag: &str, value: &Value) -> Vec<Value> {
    match value {
        Value::String(_) => text_contains(property, tag, value),
        Value::Array(items) => items
            .iter()
            .flat_map(|item| text_contains(property, tag, item))
            .collect(),
        _ => Vec::new(),
    }
}

fn number_equals(property: &str, tag: &str, value: &Value) -> Vec<Value> {
    coerce_number(value)
        .map(|n| vec![predicate(property, tag, json!({ "equals": n }))])
        .unwrap_or_default()
}

fn unknown_contains(property: &str, _tag: &str, value: &Value) -> Vec<Value> {
    text_contains(property, "rich_text", value)
}
