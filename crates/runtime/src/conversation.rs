//! The request/tool-call loop.

use crate::model::{Backend, Message, ModelRequest, ToolCall, ToolResult, Usage};
use crate::tools::{ToolError, ToolRegistry, bind_arguments};
use crate::{Error, Result};
use policy::{ApprovalGate, ApprovalRequest};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Model requests allowed per run unless configured otherwise.
pub const DEFAULT_MAX_TURNS: usize = 32;

pub const DECLINED: &str = "Tool call declined by user";

/// One run of a prompt against a model, with tools.
///
/// The message history only grows. Each model request carries all of it
/// plus the registry's tool specs; every tool call in a response gets
/// exactly one result, echoing its id, before the next request.
pub struct Conversation<B> {
    backend: B,
    registry: ToolRegistry,
    gate: ApprovalGate,
    max_turns: usize,
    messages: Vec<Message>,
    usage: Usage,
}

impl<B: Backend> Conversation<B> {
    pub fn new(backend: B, registry: ToolRegistry, gate: ApprovalGate) -> Self {
        Self {
            backend,
            registry,
            gate,
            max_turns: DEFAULT_MAX_TURNS,
            messages: Vec::new(),
            usage: Usage::default(),
        }
    }

    /// Limit on model requests per run; `0` means no limit.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Tokens used so far, summed over every request.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Send `initial` and keep answering tool calls until the model replies
    /// without any. Returns that reply's text.
    pub async fn run(&mut self, initial: Vec<Message>) -> Result<String> {
        self.messages.extend(initial);
        let specs = self.registry.specs();
        let mut turns = 0;

        loop {
            if self.max_turns != 0 && turns >= self.max_turns {
                return Err(Error::TurnLimit(self.max_turns));
            }
            turns += 1;

            debug!(turn = turns, messages = self.messages.len(), "requesting completion");
            let response = self
                .backend
                .call(ModelRequest {
                    messages: &self.messages,
                    tools: &specs,
                })
                .await?;
            self.usage.input_tokens += response.usage.input_tokens;
            self.usage.output_tokens += response.usage.output_tokens;

            let calls = response.message.tool_calls();
            let text = response.message.text();
            self.messages.push(response.message);

            if calls.is_empty() {
                return Ok(text);
            }

            for call in &calls {
                let result = self.handle(call).await?;
                self.messages.push(Message::tool_result(result));
            }
        }
    }

    /// Produce the result for one call. Only an approval prompt that
    /// cannot be asked is an error.
    async fn handle(&mut self, call: &ToolCall) -> Result<ToolResult> {
        let Ok(tool) = self.registry.get(&call.name) else {
            warn!(call_id = %call.id, "Unknown tool: {}", call.name);
            return Ok(ToolResult::error(
                &call.id,
                format!("Unknown tool: {}", call.name),
            ));
        };

        let arguments = match parse_arguments(&call.arguments)
            .and_then(|args| bind_arguments(&tool.descriptor, &tool.defaults, args))
        {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "invalid tool arguments");
                return Ok(ToolResult::error(
                    &call.id,
                    format!("Invalid arguments: {}", reason(e)),
                ));
            }
        };

        let request = ApprovalRequest::new(
            &call.name,
            tool.descriptor.safe,
            Value::Object(arguments.clone()),
        );
        if !self.gate.should_execute(&request)? {
            return Ok(ToolResult::error(&call.id, DECLINED));
        }

        info!(tool = %call.name, call_id = %call.id, "running tool");
        match tool.handler.invoke(arguments).await {
            Ok(Value::String(text)) => Ok(ToolResult::success(&call.id, text)),
            Ok(value) => Ok(ToolResult::success(&call.id, value.to_string())),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool failed");
                Ok(ToolResult::error(&call.id, format!("Error: {}", reason(e))))
            }
        }
    }
}

/// Empty argument text means no arguments.
fn parse_arguments(raw: &str) -> std::result::Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidInput(e.to_string()))
}

fn reason(error: ToolError) -> String {
    match error {
        ToolError::InvalidInput(message) | ToolError::Execution(message) => message,
        other => other.to_string(),
    }
}
