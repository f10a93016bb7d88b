use crate::error::NotiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operation name used for results produced when synthesis itself gave up.
pub const SYNTHESIZE_OPERATION: &str = "synthesize";

/// Success payload or structured error of one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        payload: Value,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remote_code: Option<String>,
    },
}

/// Uniform result shape for every executed (or rejected) operation.
///
/// Ephemeral: aggregated per request and consumed once by the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl OperationResult {
    pub fn success(
        operation: impl Into<String>,
        database_name: Option<String>,
        arguments: Map<String, Value>,
        payload: Value,
    ) -> Self {
        Self {
            operation: operation.into(),
            database_name,
            arguments,
            outcome: Outcome::Success { payload },
        }
    }

    pub fn failure(
        operation: impl Into<String>,
        database_name: Option<String>,
        arguments: Map<String, Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            database_name,
            arguments,
            outcome: Outcome::Error {
                message: message.into(),
                remote_code: None,
            },
        }
    }

    /// Converts an error into a failed result, keeping the store's error code.
    pub fn from_error(
        operation: impl Into<String>,
        database_name: Option<String>,
        arguments: Map<String, Value>,
        error: &NotiError,
    ) -> Self {
        Self {
            operation: operation.into(),
            database_name,
            arguments,
            outcome: Outcome::Error {
                message: error.to_string(),
                remote_code: error.remote_code().map(str::to_string),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success { payload } => Some(payload),
            Outcome::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Error { message, .. } => Some(message),
        }
    }

    /// JSON shape handed to the language model as a function response.
    pub fn to_response_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "status": "error", "message": e.to_string() })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_result_serializes_flat() {
        let err = NotiError::remote_with_code("Notion API Error: Bad Req", "validation_error");
        let result = OperationResult::from_error("create", Some("todo_list".into()), Map::new(), &err);

        let value = result.to_response_value();
        assert_eq!(value["status"], "error");
        assert_eq!(value["operation"], "create");
        assert_eq!(value["remote_code"], "validation_error");
        assert!(!result.is_success());
    }

    #[test]
    fn test_success_result_exposes_payload() {
        let result = OperationResult::success("search", None, Map::new(), json!({"count": 0}));
        assert!(result.is_success());
        assert_eq!(result.payload(), Some(&json!({"count": 0})));
        assert_eq!(result.to_response_value()["status"], "success");
        assert!(result.to_response_value().get("database_name").is_none());
    }
}
