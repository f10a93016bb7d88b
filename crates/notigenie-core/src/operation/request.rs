use crate::error::{NotiError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The fixed operation vocabulary the synthesizer may emit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Search,
    Create,
    Update,
    Append,
}

/// An operation name plus raw arguments, as produced by the synthesizer.
///
/// Arguments stay untyped until [`Operation::try_from`] validates their shape;
/// property keys are only checked against the schema by the formatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub kind: OperationKind,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl OperationRequest {
    pub fn new(kind: OperationKind, arguments: Map<String, Value>) -> Self {
        Self { kind, arguments }
    }

    /// Logical database named by the arguments, if any.
    pub fn database_name(&self) -> Option<&str> {
        self.arguments
            .get("database_name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Fills `database_name` when the arguments omit it.
    ///
    /// An explicit name is left untouched, even if it names another database.
    pub fn scope_to(mut self, database_name: &str) -> Self {
        if self.database_name().is_none() {
            self.arguments.insert(
                "database_name".to_string(),
                Value::String(database_name.to_string()),
            );
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArgs {
    pub database_name: String,
    #[serde(default)]
    pub query: Option<String>,
    /// Property name to raw value; may also arrive as a JSON-encoded string.
    #[serde(default)]
    pub filter_conditions: Option<Value>,
}

impl SearchArgs {
    /// Title search term, ignoring blank strings.
    pub fn title_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateArgs {
    pub database_name: String,
    pub title: String,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateArgs {
    pub database_name: String,
    #[serde(alias = "page_id")]
    pub id: String,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppendArgs {
    #[serde(alias = "block_id", alias = "page_id")]
    pub id: String,
    #[serde(default)]
    pub children: Value,
    #[serde(default)]
    pub database_name: Option<String>,
}

/// A request whose arguments have been validated against the operation's
/// fixed argument shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Search(SearchArgs),
    Create(CreateArgs),
    Update(UpdateArgs),
    Append(AppendArgs),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Search(_) => OperationKind::Search,
            Self::Create(_) => OperationKind::Create,
            Self::Update(_) => OperationKind::Update,
            Self::Append(_) => OperationKind::Append,
        }
    }
}

impl TryFrom<&OperationRequest> for Operation {
    type Error = NotiError;

    fn try_from(request: &OperationRequest) -> Result<Self> {
        let args = Value::Object(request.arguments.clone());
        let parsed = match request.kind {
            OperationKind::Search => serde_json::from_value(args).map(Operation::Search),
            OperationKind::Create => serde_json::from_value(args).map(Operation::Create),
            OperationKind::Update => serde_json::from_value(args).map(Operation::Update),
            OperationKind::Append => serde_json::from_value(args).map(Operation::Append),
        };
        parsed.map_err(|e| NotiError::invalid_arguments(format!("{}: {}", request.kind, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn request(kind: OperationKind, args: Value) -> OperationRequest {
        match args {
            Value::Object(map) => OperationRequest::new(kind, map),
            _ => panic!("arguments must be an object"),
        }
    }

    #[test]
    fn test_kind_from_function_name() {
        assert_eq!(OperationKind::from_str("search").unwrap(), OperationKind::Search);
        assert_eq!(OperationKind::Append.to_string(), "append");
        assert!(OperationKind::from_str("delete").is_err());
    }

    #[test]
    fn test_scope_to_fills_missing_name_only() {
        let scoped = request(OperationKind::Create, json!({"title": "milk"})).scope_to("shopping_list");
        assert_eq!(scoped.database_name(), Some("shopping_list"));

        let explicit = request(
            OperationKind::Create,
            json!({"title": "milk", "database_name": "pantry"}),
        )
        .scope_to("shopping_list");
        assert_eq!(explicit.database_name(), Some("pantry"));
    }

    #[test]
    fn test_update_accepts_page_id_alias() {
        let req = request(
            OperationKind::Update,
            json!({"database_name": "todo_list", "page_id": "abc", "properties": {"Done": true}}),
        );
        match Operation::try_from(&req).unwrap() {
            Operation::Update(args) => assert_eq!(args.id, "abc"),
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[test]
    fn test_create_without_title_is_invalid() {
        let req = request(OperationKind::Create, json!({"database_name": "todo_list"}));
        let err = Operation::try_from(&req).unwrap_err();
        assert!(matches!(err, NotiError::InvalidArguments(_)));
        assert!(err.to_string().contains("create"));
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let req = request(OperationKind::Search, json!({"database_name": "x", "query": "  "}));
        match Operation::try_from(&req).unwrap() {
            Operation::Search(args) => assert_eq!(args.title_query(), None),
            other => panic!("unexpected operation: {other:?}"),
        }
    }
}
