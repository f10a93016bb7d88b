//! Schema document as stored in the schema source.

use notigenie_core::schema::{PropertyDefinition, PropertyType, SchemaEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{id, title, description, properties: {name: {type, options}}}`.
///
/// The document key (file stem) is the logical name and is not part of the
/// document itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default, alias = "database_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Property name to `{type, options?}`, in document order.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct PropertyDocument {
    #[serde(rename = "type")]
    property_type: PropertyType,
    #[serde(default)]
    options: Vec<String>,
}

impl SchemaDocument {
    /// Converts into a schema entry named `name`.
    ///
    /// Properties without a readable `type` are kept as unknown.
    pub fn into_entry(self, name: &str) -> SchemaEntry {
        let mut entry = SchemaEntry::new(name, self.id).with_description(self.description);
        if let Some(title) = self.title.filter(|t| !t.trim().is_empty()) {
            entry = entry.with_title(title);
        }

        for (property_name, raw) in self.properties {
            let definition = match serde_json::from_value::<PropertyDocument>(raw) {
                Ok(doc) => PropertyDefinition::new(property_name, doc.property_type)
                    .with_options(doc.options),
                Err(e) => {
                    tracing::warn!(schema = name, property = %property_name, error = %e, "Unreadable property definition");
                    PropertyDefinition::new(property_name, PropertyType::Unknown(String::new()))
                }
            };
            entry = entry.with_property(definition);
        }
        entry
    }
}
