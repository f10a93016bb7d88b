//! Gemini language model over the generateContent REST API.

use async_trait::async_trait;
use notigenie_core::config::LlmConfig;
use notigenie_core::llm::{
    ChatContent, ChatRole, ContentPart, FunctionCall, Generation, GenerationRequest,
    LanguageModel, ToolMode,
};
use notigenie_core::{NotiError, Result};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const MALFORMED_FUNCTION_CALL: &str = "MALFORMED_FUNCTION_CALL";

/// Language model backed by the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiLanguageModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiLanguageModel {
    pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotiError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| NotiError::llm(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        response
            .json()
            .await
            .map_err(|err| NotiError::parse(format!("Failed to parse Gemini response: {err}")))
    }
}

#[async_trait]
impl LanguageModel for GeminiLanguageModel {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        let body = GenerateContentRequest::from_generation(&request);
        debug!(
            model = %self.model,
            contents = body.contents.len(),
            tools = request.tools.len(),
            "Sending generateContent request"
        );
        let response = self.send_request(&body).await?;
        extract_generation(response)
    }

    async fn research(&self, utterance: &str, current_date: &str) -> Result<Option<String>> {
        let body = GenerateContentRequest {
            contents: vec![Content::text(
                "user",
                format!(
                    "Today is {current_date}. Collect facts from the web that help carry out this request, \
                     as short plain-text notes. Request: {utterance}"
                ),
            )],
            system_instruction: None,
            tools: vec![Tool::GoogleSearch {
                google_search: Map::new(),
            }],
            tool_config: None,
        };
        let generation = extract_generation(self.send_request(&body).await?)?;
        Ok(generation.trimmed_text().map(str::to_string))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<Value>,
}

impl GenerateContentRequest {
    fn from_generation(request: &GenerationRequest) -> Self {
        let contents = request.contents.iter().map(Content::from_chat).collect();

        let system_instruction = request
            .system_instruction
            .as_ref()
            .map(|text| Content::text("system", text.clone()));

        let (tools, tool_config) = if request.tools.is_empty() {
            (Vec::new(), None)
        } else {
            let declarations = request
                .tools
                .iter()
                .map(|d| {
                    json!({
                        "name": d.name,
                        "description": d.description,
                        "parameters": d.parameters,
                    })
                })
                .collect();
            let config = match &request.tool_mode {
                ToolMode::Auto => json!({ "functionCallingConfig": { "mode": "AUTO" } }),
                ToolMode::Any(allowed) if allowed.is_empty() => {
                    json!({ "functionCallingConfig": { "mode": "ANY" } })
                }
                ToolMode::Any(allowed) => json!({
                    "functionCallingConfig": { "mode": "ANY", "allowedFunctionNames": allowed }
                }),
                ToolMode::Disabled => json!({ "functionCallingConfig": { "mode": "NONE" } }),
            };
            (
                vec![Tool::Functions {
                    function_declarations: declarations,
                }],
                Some(config),
            )
        };

        Self {
            contents,
            system_instruction,
            tools,
            tool_config,
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: String) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part::Text { text }],
        }
    }

    fn from_chat(content: &ChatContent) -> Self {
        let role = match content.role {
            ChatRole::User | ChatRole::Function => "user",
            ChatRole::Model => "model",
        };
        Self {
            role: role.to_string(),
            parts: content.parts.iter().map(Part::from_chat).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: Value,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: Value,
    },
}

impl Part {
    fn from_chat(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Part::Text { text: text.clone() },
            ContentPart::FunctionCall(call) => Part::FunctionCall {
                function_call: json!({ "name": call.name, "args": call.args }),
            },
            ContentPart::FunctionResponse { name, response } => Part::FunctionResponse {
                function_response: json!({ "name": name, "response": response }),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Tool {
    Functions {
        #[serde(rename = "functionDeclarations")]
        function_declarations: Vec<Value>,
    },
    GoogleSearch {
        google_search: Map<String, Value>,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    function_call: Option<FunctionCallResponse>,
}

#[derive(Deserialize)]
struct FunctionCallResponse {
    name: String,
    #[serde(default)]
    args: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_generation(response: GenerateContentResponse) -> Result<Generation> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(NotiError::llm(format!("Gemini blocked the prompt: {reason}")));
    }

    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .ok_or_else(|| NotiError::llm("Gemini API returned no candidates"))?;

    if candidate.finish_reason.as_deref() == Some(MALFORMED_FUNCTION_CALL) {
        return Err(NotiError::parse("Gemini produced a malformed function call"));
    }

    let mut text = String::new();
    let mut function_calls = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            let args = match call.args {
                Some(Value::Object(map)) => map,
                None | Some(Value::Null) => Map::new(),
                Some(other) => {
                    warn!(function = %call.name, "Function call arguments are not an object");
                    return Err(NotiError::parse(format!(
                        "Arguments of '{}' are not an object: {}",
                        call.name, other
                    )));
                }
            };
            function_calls.push(FunctionCall::new(call.name, args));
        }
    }

    Ok(Generation {
        text: (!text.is_empty()).then_some(text),
        function_calls,
    })
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> NotiError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    match retry_after {
        Some(delay) => NotiError::llm(format!(
            "HTTP {}: {} (retry after {}s)",
            status.as_u16(),
            message,
            delay.as_secs()
        )),
        None => NotiError::llm(format!("HTTP {}: {}", status.as_u16(), message)),
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.parse::<u64>().ok().map(Duration::from_secs)
}
