//! Prompt templates.
//!
//! Each pipeline stage renders its system instruction from a minijinja
//! template. The built-in templates can be replaced through the `[prompts]`
//! section of `config.toml`; overrides are compiled once at startup so a
//! broken template fails fast instead of on the first request.

use minijinja::{Environment, context};
use notigenie_core::config::PromptConfig;
use notigenie_core::schema::SchemaEntry;
use notigenie_core::{NotiError, Result};
use serde::Serialize;

const SELECTION_TEMPLATE: &str = r#"You route requests for a personal assistant that manages several databases.
Today is {{ current_date }}.

Registered databases:
{% for line in summaries -%}
{{ line }}
{% endfor %}
Decide which databases the user's latest message needs to read or modify and
call `select_databases` with their names. Use only names from the list above.
If the message is small talk or needs no database, call it with an empty list."#;

const SYNTHESIS_TEMPLATE: &str = r#"You turn a user's request into operations on the database "{{ schema.name }}" ({{ schema.title }}).
Today is {{ current_date }}. Resolve relative dates ("tomorrow", "next Friday") against it and write dates as YYYY-MM-DD.
{% if schema.description %}
About this database: {{ schema.description }}
{% endif %}
Properties:
{% for prop in schema.properties -%}
- {{ prop.name }} ({{ prop.type }}){% if prop.options %} options: {{ prop.options | join(", ") }}{% endif %}
{% endfor %}
The title property is "{{ title_property }}".

Available functions:
- search: find pages. `query` matches the title; `filter_conditions` is a JSON object of property name to value.
- create: add a page. `title` is required; `properties` is a JSON object of property name to value.
- update: change an existing page by `id`; `properties` is a JSON object of property name to value.
- append: add text blocks to an existing page by `id`.

Only use property names listed above. Use ids that appear in the conversation; never invent them.
If the request needs nothing from this database, answer briefly without calling a function.
{% if research_notes %}
Research notes gathered for this request:
{{ research_notes }}
{% endif %}"#;

const COMPOSITION_TEMPLATE: &str = r#"You are a friendly personal assistant. Today is {{ current_date }}.
{% if has_results -%}
The function results above describe what was done for the user's latest message.
Tell the user the outcome in a few natural sentences. Mention failures honestly.
{%- else -%}
No database work was needed for the user's latest message. Reply conversationally.
{%- endif %}
Answer in the user's language. Do not use markdown, bullet symbols, code blocks or emoji;
the reply may be read aloud."#;

/// Per-property context passed to the synthesis template.
#[derive(Debug, Serialize)]
struct PropertyView<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    property_type: &'a str,
    options: &'a [String],
}

#[derive(Debug, Serialize)]
struct SchemaView<'a> {
    name: &'a str,
    title: &'a str,
    description: &'a str,
    properties: Vec<PropertyView<'a>>,
}

impl<'a> SchemaView<'a> {
    fn new(schema: &'a SchemaEntry) -> Self {
        Self {
            name: &schema.name,
            title: &schema.title,
            description: &schema.description,
            properties: schema
                .properties
                .iter()
                .map(|p| PropertyView {
                    name: &p.name,
                    property_type: p.property_type.tag(),
                    options: &p.options,
                })
                .collect(),
        }
    }
}

/// The three stage templates, built-in or overridden.
#[derive(Debug, Clone)]
pub struct PromptSet {
    selection: String,
    synthesis: String,
    composition: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            selection: SELECTION_TEMPLATE.to_string(),
            synthesis: SYNTHESIS_TEMPLATE.to_string(),
            composition: COMPOSITION_TEMPLATE.to_string(),
        }
    }
}

impl PromptSet {
    /// Builds the set from configuration, validating every override.
    pub fn from_config(config: &PromptConfig) -> Result<Self> {
        let mut set = Self::default();
        if let Some(source) = &config.selection {
            set.selection = checked("selection", source)?;
        }
        if let Some(source) = &config.synthesis {
            set.synthesis = checked("synthesis", source)?;
        }
        if let Some(source) = &config.composition {
            set.composition = checked("composition", source)?;
        }
        Ok(set)
    }

    pub fn render_selection(&self, summaries: &[String], current_date: &str) -> Result<String> {
        render(
            "selection",
            &self.selection,
            context! { summaries => summaries, current_date => current_date },
        )
    }

    /// Renders the synthesis instruction for exactly one schema.
    ///
    /// # Arguments
    ///
    /// * `schema` - The schema the model is scoped to
    /// * `title_property` - Resolved title property of that schema
    /// * `current_date` - Date used to resolve relative expressions
    /// * `research_notes` - Optional grounded notes for this request
    pub fn render_synthesis(
        &self,
        schema: &SchemaEntry,
        title_property: &str,
        current_date: &str,
        research_notes: Option<&str>,
    ) -> Result<String> {
        render(
            "synthesis",
            &self.synthesis,
            context! {
                schema => SchemaView::new(schema),
                title_property => title_property,
                current_date => current_date,
                research_notes => research_notes,
            },
        )
    }

    pub fn render_composition(&self, current_date: &str, has_results: bool) -> Result<String> {
        render(
            "composition",
            &self.composition,
            context! { current_date => current_date, has_results => has_results },
        )
    }
}

fn checked(name: &str, source: &str) -> Result<String> {
    let env = Environment::new();
    env.template_from_str(source)
        .map(|_| source.to_string())
        .map_err(|e| NotiError::config(format!("prompts.{}: {}", name, e)))
}

fn render<S: Serialize>(name: &str, source: &str, ctx: S) -> Result<String> {
    Environment::new()
        .render_str(source, ctx)
        .map(|text| text.trim().to_string())
        .map_err(|e| NotiError::internal(format!("failed to render {} prompt: {}", name, e)))
}
