//! Operation Formatter.
//!
//! Translates logical property values and filter conditions into the record
//! store's typed wire representation. Type dispatch goes through the closed
//! [`PropertyType`] set: every variant maps to exactly one predicate builder
//! and one wrapper builder, with [`PropertyType::Unknown`] carrying the
//! fallback behavior.
//!
//! # Module Structure
//!
//! - `normalize`: One-time argument normalization (JSON strings, children)
//! - `filter`: Predicate builders per property type
//! - `properties`: Wire-wrapper builders per property type
//! - `flatten`: Raw page objects back to plain summaries

mod filter;
mod flatten;
mod normalize;
mod properties;

pub use flatten::{PageSummary, flatten_page, flatten_property, plain_text};
pub use normalize::{
    coerce_checkbox, coerce_number, coerce_object, normalize_children, paragraph_block,
};

use crate::error::Result;
use crate::schema::{PropertyType, SchemaRegistry, normalize_identifier};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Default name assumed for a schema's title property when none is declared.
pub const DEFAULT_TITLE_PROPERTY: &str = "Name";

static UNKNOWN: PropertyType = PropertyType::Unknown(String::new());

/// Schema-aware translator from logical operations to wire payloads.
///
/// Holds the shared registry; every lookup is scoped by schema name so a
/// property name declared in several schemas never resolves ambiguously.
#[derive(Debug, Clone)]
pub struct OperationFormatter {
    registry: Arc<SchemaRegistry>,
    default_title_property: String,
}

impl OperationFormatter {
    pub fn new(registry: Arc<SchemaRegistry>, default_title_property: impl Into<String>) -> Self {
        Self {
            registry,
            default_title_property: default_title_property.into(),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Remote identifier for a logical name, normalized.
    ///
    /// Fails with `NotFound` for unknown names and `InvalidIdentifier` for
    /// malformed registry entries.
    pub fn resolve_database_id(&self, schema_name: &str) -> Result<String> {
        self.registry.resolve_database_id(schema_name)
    }

    /// Canonical dashed form of a page or block identifier.
    pub fn normalize_record_id(&self, raw: &str) -> Result<String> {
        normalize_identifier(raw)
    }

    /// The schema's title property, or the configured default.
    pub fn resolve_title_property(&self, schema_name: &str) -> String {
        self.registry
            .get(schema_name)
            .and_then(|schema| schema.title_property())
            .unwrap_or(self.default_title_property.as_str())
            .to_string()
    }

    fn property_type(&self, schema_name: &str, property: &str) -> &PropertyType {
        self.registry
            .resolve_property_type(schema_name, property)
            .unwrap_or(&UNKNOWN)
    }

    /// Compiles raw conditions and an optional title search into a filter.
    ///
    /// Returns `None` when nothing yields a predicate, meaning "list all".
    pub fn format_filter(
        &self,
        schema_name: &str,
        raw_conditions: Option<&Value>,
        title_query: Option<&str>,
    ) -> Option<Value> {
        let conditions = coerce_object(raw_conditions, "filter_conditions");
        let mut predicates = Vec::with_capacity(conditions.len() + 1);

        if let Some(query) = title_query.map(str::trim).filter(|q| !q.is_empty()) {
            predicates.push(filter::title_contains(
                &self.resolve_title_property(schema_name),
                query,
            ));
        }

        for (property, value) in &conditions {
            let property_type = self.property_type(schema_name, property);
            let build = filter::predicate_builder(property_type);
            let built = build(property, property_type.tag(), value);
            if built.is_empty() {
                debug!(schema_name, property, "Condition produced no predicate; omitted");
            }
            predicates.extend(built);
        }

        filter::combine(predicates)
    }

    /// Wraps raw property values in their typed wire form.
    ///
    /// Values already in wire form pass through, so formatting is idempotent.
    /// Values whose type is unknown, or that cannot be coerced, are kept as is.
    pub fn format_properties(&self, schema_name: &str, raw_props: Option<&Value>) -> Map<String, Value> {
        coerce_object(raw_props, "properties")
            .into_iter()
            .map(|(property, value)| {
                let property_type = self.property_type(schema_name, &property);
                let formatted = if properties::is_wrapped(&value, property_type.tag()) {
                    value
                } else {
                    properties::wrapper_builder(property_type)(&value).unwrap_or(value)
                };
                (property, formatted)
            })
            .collect()
    }

    /// Properties for a new page: the formatted extras plus the title.
    ///
    /// The explicit title always wins over a title value in `raw_props`.
    pub fn format_create_properties(
        &self,
        schema_name: &str,
        title: &str,
        raw_props: Option<&Value>,
    ) -> Map<String, Value> {
        let mut formatted = self.format_properties(schema_name, raw_props);
        if let Some(wrapped) = properties::title(&Value::String(title.to_string())) {
            formatted.insert(self.resolve_title_property(schema_name), wrapped);
        }
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyDefinition, SchemaEntry};
    use serde_json::json;

    fn formatter() -> OperationFormatter {
        let shopping = SchemaEntry::new("shopping_list", "1ff1ac9c8c708098bf4ac641178c9b8d")
            .with_property(PropertyDefinition::new("Name", PropertyType::Title))
            .with_property(PropertyDefinition::new("Done", PropertyType::Checkbox))
            .with_property(
                PropertyDefinition::new("Category", PropertyType::Select)
                    .with_options(["Food", "Household"]),
            )
            .with_property(PropertyDefinition::new("Status", PropertyType::Status))
            .with_property(PropertyDefinition::new("Memo", PropertyType::RichText))
            .with_property(PropertyDefinition::new("Due", PropertyType::Date))
            .with_property(PropertyDefinition::new("Tags", PropertyType::MultiSelect))
            .with_property(PropertyDefinition::new("Count", PropertyType::Number))
            .with_property(PropertyDefinition::new("Link", PropertyType::Url));
        let todo = SchemaEntry::new("todo_list", "12345678-1234-5678-1234-567812345678")
            .with_property(PropertyDefinition::new("Task", PropertyType::Title))
            .with_property(PropertyDefinition::new("Done", PropertyType::Status));
        let untitled = SchemaEntry::new("notes", "12345678123456781234567812345678")
            .with_property(PropertyDefinition::new("Body", PropertyType::RichText));

        let registry = SchemaRegistry::from_entries([shopping, todo, untitled]);
        OperationFormatter::new(Arc::new(registry), "Title")
    }

    #[test]
    fn test_checkbox_filter() {
        let filter = formatter().format_filter("shopping_list", Some(&json!({"Done": false})), None);
        assert_eq!(
            filter,
            Some(json!({"property": "Done", "checkbox": {"equals": false}}))
        );
    }

    #[test]
    fn test_null_conditions_add_no_predicate() {
        let f = formatter();
        for property in ["Done", "Category", "Status", "Due"] {
            let conditions = json!({ property: null });
            assert_eq!(
                f.format_filter("shopping_list", Some(&conditions), None),
                None,
                "{property}"
            );
        }
    }

    #[test]
    fn test_same_property_resolves_per_schema() {
        let filter = formatter().format_filter("todo_list", Some(&json!({"Done": "Finished"})), None);
        assert_eq!(
            filter,
            Some(json!({"property": "Done", "status": {"equals": "Finished"}}))
        );
    }

    #[test]
    fn test_select_and_date_filters() {
        let f = formatter();
        assert_eq!(
            f.format_filter("shopping_list", Some(&json!({"Category": "Food"})), None),
            Some(json!({"property": "Category", "select": {"equals": "Food"}}))
        );
        assert_eq!(
            f.format_filter("shopping_list", Some(&json!({"Due": {"after": "2025-01-01"}})), None),
            Some(json!({"property": "Due", "date": {"after": "2025-01-01"}}))
        );
        assert_eq!(
            f.format_filter("shopping_list", Some(&json!({"Due": "2025-01-01"})), None),
            Some(json!({"property": "Due", "date": {"equals": "2025-01-01"}}))
        );
    }

    #[test]
    fn test_query_and_conditions_combine_under_and() {
        let filter = formatter()
            .format_filter(
                "shopping_list",
                Some(&json!("{\"Done\": false, \"Category\": \"Food\"}")),
                Some("milk"),
            )
            .unwrap();
        let predicates = filter["and"].as_array().unwrap();
        assert_eq!(predicates.len(), 3);
        assert!(predicates.contains(&json!({"property": "Name", "title": {"contains": "milk"}})));
        assert!(predicates.contains(&json!({"property": "Done", "checkbox": {"equals": false}})));
        assert!(predicates.contains(&json!({"property": "Category", "select": {"equals": "Food"}})));
    }

    #[test]
    fn test_unknown_property_contains_only_for_strings() {
        let f = formatter();
        assert_eq!(
            f.format_filter("shopping_list", Some(&json!({"Shop": "corner store"})), None),
            Some(json!({"property": "Shop", "rich_text": {"contains": "corner store"}}))
        );
        assert_eq!(
            f.format_filter("shopping_list", Some(&json!({"Shop": 3})), None),
            None
        );
        assert_eq!(
            f.format_filter("missing_schema", Some(&json!({"Done": true})), None),
            None
        );
    }

    #[test]
    fn test_no_conditions_means_no_filter() {
        let f = formatter();
        assert_eq!(f.format_filter("shopping_list", None, None), None);
        assert_eq!(f.format_filter("shopping_list", Some(&json!("{invalid_json")), None), None);
        assert_eq!(f.format_filter("shopping_list", Some(&json!({})), Some("  ")), None);
    }

    #[test]
    fn test_title_property_default_is_configurable() {
        let f = formatter();
        assert_eq!(f.resolve_title_property("shopping_list"), "Name");
        assert_eq!(f.resolve_title_property("notes"), "Title");
        assert_eq!(f.resolve_title_property("missing_schema"), "Title");
        assert_eq!(
            f.format_filter("notes", None, Some("plan")),
            Some(json!({"property": "Title", "title": {"contains": "plan"}}))
        );
    }

    #[test]
    fn test_format_properties_per_type() {
        let props = formatter().format_properties(
            "shopping_list",
            Some(&json!({
                "Memo": "organic",
                "Category": "Food",
                "Status": "In Progress",
                "Tags": ["A", "B"],
                "Due": "2025-01-01",
                "Done": 1,
                "Count": "10.5",
                "Link": "http://example.com",
                "Unknown": "val"
            })),
        );
        assert_eq!(props["Memo"], json!({"rich_text": [{"text": {"content": "organic"}}]}));
        assert_eq!(props["Category"], json!({"select": {"name": "Food"}}));
        assert_eq!(props["Status"], json!({"status": {"name": "In Progress"}}));
        assert_eq!(props["Tags"], json!({"multi_select": [{"name": "A"}, {"name": "B"}]}));
        assert_eq!(props["Due"], json!({"date": {"start": "2025-01-01"}}));
        assert_eq!(props["Done"], json!({"checkbox": true}));
        assert_eq!(props["Count"], json!({"number": 10.5}));
        assert_eq!(props["Link"], json!({"url": "http://example.com"}));
        assert_eq!(props["Unknown"], json!("val"));
    }

    #[test]
    fn test_unparseable_number_passes_through() {
        let props = formatter().format_properties("shopping_list", Some(&json!({"Count": "invalid"})));
        assert_eq!(props["Count"], json!("invalid"));
    }

    #[test]
    fn test_format_properties_is_idempotent() {
        let f = formatter();
        let raw = json!({
            "Name": "milk",
            "Done": "no",
            "Tags": "Single",
            "Count": "x",
            "Due": {"start": "2025-01-01", "end": "2025-01-03"},
            "Extra": {"nested": true}
        });
        let once = f.format_properties("shopping_list", Some(&raw));
        let twice = f.format_properties("shopping_list", Some(&Value::Object(once.clone())));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_create_properties_wrap_title() {
        let props = formatter().format_create_properties(
            "shopping_list",
            "milk",
            Some(&json!({"Name": "ignored", "Done": false})),
        );
        assert_eq!(props["Name"], json!({"title": [{"text": {"content": "milk"}}]}));
        assert_eq!(props["Done"], json!({"checkbox": false}));
    }

    #[test]
    fn test_identifier_resolution() {
        let f = formatter();
        assert_eq!(
            f.resolve_database_id("shopping_list").unwrap(),
            "1ff1ac9c-8c70-8098-bf4a-c641178c9b8d"
        );
        assert!(f.resolve_database_id("garden").unwrap_err().is_not_found());
        assert!(f.normalize_record_id("bad-id").unwrap_err().is_invalid_identifier());
    }
}
