//! Anthropic API backend.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolSpec,
    Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ApiContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackendBuilder {
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> AnthropicBackend {
        AnthropicBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
        }
    }
}

/// Anthropic API backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> AnthropicBackendBuilder {
        AnthropicBackendBuilder::new(api_key, model)
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            // System text travels in the top-level `system` field; tool
            // results are user turns on this API.
            Role::User | Role::System | Role::Tool => "user",
            Role::Assistant => "assistant",
        }
    }

    fn part_to_api(part: &Part) -> ApiContentBlock {
        match part {
            Part::Text(text) => ApiContentBlock::Text { text: text.clone() },
            Part::ToolCall(call) => ApiContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: serde_json::from_str(&call.arguments)
                    .unwrap_or_else(|_| Value::Object(Default::default())),
            },
            Part::ToolResult(result) => ApiContentBlock::ToolResult {
                tool_use_id: result.tool_call_id.clone(),
                content: result.outcome.content().to_string(),
                is_error: result.outcome.is_error(),
            },
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage {
        let role = Self::role_to_api(msg.role);

        // Simple case: single text part
        if let [Part::Text(text)] = msg.parts.as_slice() {
            return ApiMessage {
                role,
                content: ApiContent::Text(text.clone()),
            };
        }

        ApiMessage {
            role,
            content: ApiContent::Blocks(msg.parts.iter().map(Self::part_to_api).collect()),
        }
    }

    /// Consecutive tool-role messages fold into one user turn, since the
    /// API expects every result for an assistant turn in the next message.
    fn messages_to_api(messages: &[Message]) -> Vec<ApiMessage> {
        let mut out: Vec<ApiMessage> = Vec::new();
        let mut previous: Option<Role> = None;

        for msg in messages.iter().filter(|m| m.role != Role::System) {
            let api = Self::message_to_api(msg);
            match (previous, out.last_mut()) {
                (
                    Some(Role::Tool),
                    Some(ApiMessage {
                        content: ApiContent::Blocks(blocks),
                        ..
                    }),
                ) if msg.role == Role::Tool => {
                    if let ApiContent::Blocks(more) = api.content {
                        blocks.extend(more);
                    }
                }
                _ => out.push(api),
            }
            previous = Some(msg.role);
        }
        out
    }

    fn system_prompt(messages: &[Message]) -> Option<String> {
        let system: Vec<String> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(Message::text)
            .collect();
        (!system.is_empty()).then(|| system.join("\n\n"))
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool {
        ApiTool {
            name: spec.name.clone(),
            description: spec.description.clone(),
            input_schema: spec.schema.clone(),
        }
    }

    fn build_request(&self, request: ModelRequest<'_>) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: Self::messages_to_api(request.messages),
            system: Self::system_prompt(request.messages),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
        }
    }

    fn response_to_message(blocks: Vec<ApiResponseBlock>) -> Message {
        let parts: Vec<Part> = blocks
            .into_iter()
            .filter_map(|block| match block {
                ApiResponseBlock::Text { text } => Some(Part::Text(text)),
                ApiResponseBlock::ToolUse { id, name, input } => {
                    Some(Part::ToolCall(ToolCall::new(id, name, input.to_string())))
                }
                ApiResponseBlock::Unknown => None,
            })
            .collect();

        Message {
            role: Role::Assistant,
            parts,
        }
    }
}

impl std::fmt::Display for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({}, max_tokens={})", self.model, self.max_tokens)
    }
}

impl Backend for AnthropicBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = self.build_request(request);
        debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "sending messages request"
        );

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .header("x-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let message = Self::response_to_message(api_response.content);
        let usage = Usage {
            input_tokens: api_response.usage.input_tokens,
            output_tokens: api_response.usage.output_tokens,
        };

        Ok(ModelResponse { message, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;
    use serde_json::json;

    fn backend() -> AnthropicBackend {
        AnthropicBackend::builder("test-key", "claude-sonnet-4-20250514").build()
    }

    #[test]
    fn display_names_model() {
        assert_eq!(
            backend().to_string(),
            "anthropic(claude-sonnet-4-20250514, max_tokens=4096)"
        );
    }

    #[test]
    fn system_messages_move_to_system_field() {
        let messages = vec![Message::system("Be brief."), Message::user("Hi")];
        let body = serde_json::to_value(backend().build_request(ModelRequest {
            messages: &messages,
            tools: &[],
        }))
        .unwrap();

        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["messages"], json!([{"role": "user", "content": "Hi"}]));
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn tool_results_fold_into_one_user_turn() {
        let messages = vec![
            Message::user("Add twice"),
            Message {
                role: Role::Assistant,
                parts: vec![
                    Part::ToolCall(ToolCall::new("a", "add", r#"{"x": 1}"#)),
                    Part::ToolCall(ToolCall::new("b", "add", "not json")),
                ],
            },
            Message::tool_result(ToolResult::success("a", "2")),
            Message::tool_result(ToolResult::error("b", "Invalid arguments")),
        ];

        let body = serde_json::to_value(backend().build_request(ModelRequest {
            messages: &messages,
            tools: &[],
        }))
        .unwrap();

        let api_messages = body["messages"].as_array().unwrap();
        assert_eq!(api_messages.len(), 3);
        assert_eq!(api_messages[1]["content"][0]["input"], json!({"x": 1}));
        assert_eq!(api_messages[1]["content"][1]["input"], json!({}));
        assert_eq!(
            api_messages[2],
            json!({
                "role": "user",
                "content": [
                    {"type": "tool_result", "tool_use_id": "a", "content": "2"},
                    {"type": "tool_result", "tool_use_id": "b", "content": "Invalid arguments", "is_error": true}
                ]
            })
        );
    }

    #[test]
    fn tool_use_input_becomes_argument_text() {
        let response: ApiResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Let me add."},
                {"type": "tool_use", "id": "toolu_1", "name": "add", "input": {"a": 2}},
                {"type": "thinking", "thinking": "..."}
            ],
            "usage": {"input_tokens": 1, "output_tokens": 2}
        }))
        .unwrap();

        let message = AnthropicBackend::response_to_message(response.content);
        assert_eq!(message.text(), "Let me add.");
        assert_eq!(
            message.tool_calls(),
            vec![ToolCall::new("toolu_1", "add", r#"{"a":2}"#)]
        );
    }
}
