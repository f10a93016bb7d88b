//! Schema domain model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::EnumString;

/// Closed set of property types the record store understands.
///
/// Anything outside the set is kept verbatim in [`PropertyType::Unknown`] and
/// formatted with the documented fallback behavior.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    Title,
    RichText,
    Select,
    MultiSelect,
    Status,
    Date,
    Checkbox,
    Number,
    Url,
    #[strum(default)]
    Unknown(String),
}

impl PropertyType {
    /// The store's type tag, which is also the key of its wire wrapper.
    pub fn tag(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Status => "status",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Number => "number",
            Self::Url => "url",
            Self::Unknown(tag) => tag,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl From<String> for PropertyType {
    fn from(tag: String) -> Self {
        // EnumString with a default variant never fails.
        PropertyType::from_str(tag.trim()).unwrap_or(PropertyType::Unknown(tag))
    }
}

impl From<PropertyType> for String {
    fn from(property_type: PropertyType) -> Self {
        property_type.tag().to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One declared property of a logical database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Enumerated option values for select-like properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// Declared shape of one logical database.
///
/// Immutable once loaded; a process restart is the only way to pick up changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// Logical name, unique within the registry (e.g. `shopping_list`).
    pub name: String,
    /// Remote identifier of the database in the record store.
    pub database_id: String,
    /// Human title.
    pub title: String,
    pub description: String,
    /// Properties in declaration order.
    pub properties: Vec<PropertyDefinition>,
}

impl SchemaEntry {
    pub fn new(name: impl Into<String>, database_id: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            database_id: database_id.into(),
            description: String::new(),
            properties: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// Looks up a declared property by exact name.
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Name of the property tagged as the title, if the schema declares one.
    pub fn title_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.property_type == PropertyType::Title)
            .map(|p| p.name.as_str())
    }

    /// Number of properties tagged as title.
    pub fn title_property_count(&self) -> usize {
        self.properties
            .iter()
            .filter(|p| p.property_type == PropertyType::Title)
            .count()
    }

    /// Compact one-line summary used when choosing between databases.
    pub fn summary_line(&self) -> String {
        if self.description.is_empty() {
            format!("- {} ({})", self.name, self.title)
        } else {
            format!("- {} ({}): {}", self.name, self.title, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_type_parses_known_tags() {
        assert_eq!(PropertyType::from("rich_text".to_string()), PropertyType::RichText);
        assert_eq!(
            PropertyType::from("multi_select".to_string()),
            PropertyType::MultiSelect
        );
        assert_eq!(PropertyType::from("checkbox".to_string()), PropertyType::Checkbox);
    }

    #[test]
    fn test_property_type_keeps_unknown_tag() {
        let parsed = PropertyType::from("relation".to_string());
        assert_eq!(parsed, PropertyType::Unknown("relation".to_string()));
        assert_eq!(parsed.tag(), "relation");
        assert!(parsed.is_unknown());
    }

    #[test]
    fn test_property_type_serde_uses_tag() {
        let json = serde_json::to_string(&PropertyType::MultiSelect).unwrap();
        assert_eq!(json, "\"multi_select\"");
        let back: PropertyType = serde_json::from_str("\"status\"").unwrap();
        assert_eq!(back, PropertyType::Status);
    }

    #[test]
    fn test_title_property_lookup() {
        let schema = SchemaEntry::new("shopping_list", "db")
            .with_property(PropertyDefinition::new("Done", PropertyType::Checkbox))
            .with_property(PropertyDefinition::new("Name", PropertyType::Title));

        assert_eq!(schema.title_property(), Some("Name"));
        assert_eq!(schema.title_property_count(), 1);
        assert!(schema.property("Done").is_some());
        assert!(schema.property("done").is_none());
    }

    #[test]
    fn test_summary_line() {
        let schema = SchemaEntry::new("todo_list", "db")
            .with_title("Tasks")
            .with_description("Things to do");
        assert_eq!(schema.summary_line(), "- todo_list (Tasks): Things to do");
    }
}
