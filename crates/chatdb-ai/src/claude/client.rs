//! Claude API client struct, request building, and response parsing.

use reqwest::header::{HeaderMap, HeaderValue};

use crate::tools::to_claude_tool;
use crate::{
    build_http_client, AiError, AiResponse, Message, Role, TokenUsage, ToolCall, ToolChoice,
    ToolDefinition,
};

use super::config::ClaudeConfig;

pub(crate) const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub(crate) const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude API client.
pub struct ClaudeClient {
    pub(crate) config: ClaudeConfig,
    pub(crate) http: reqwest::Client,
}

impl ClaudeClient {
    pub fn new(config: ClaudeConfig) -> Result<Self, AiError> {
        Ok(Self {
            config,
            http: build_http_client()?,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub(crate) fn auth_headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.config.api_key)
            .map_err(|_| AiError::ApiError("API key is not a valid header value".into()))?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        Ok(headers)
    }

    /// Build the JSON request body for the Messages API.
    ///
    /// System messages are joined into the top-level `system` field. Tool
    /// results become `tool_result` blocks in a user message; consecutive
    /// results share one message.
    pub(crate) fn build_request_body(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> serde_json::Value {
        let mut msgs: Vec<serde_json::Value> = Vec::new();
        let mut system_parts: Vec<&str> = Vec::new();
        let mut last_was_tool_result = false;

        for msg in messages {
            match msg.role {
                Role::System => {
                    system_parts.push(&msg.content);
                    continue;
                }
                Role::User => {
                    msgs.push(serde_json::json!({ "role": "user", "content": msg.content }));
                }
                Role::Assistant if msg.tool_calls.is_empty() => {
                    msgs.push(serde_json::json!({ "role": "assistant", "content": msg.content }));
                }
                Role::Assistant => {
                    let mut blocks = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(serde_json::json!({ "type": "text", "text": msg.content }));
                    }
                    for call in &msg.tool_calls {
                        blocks.push(serde_json::json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        }));
                    }
                    msgs.push(serde_json::json!({ "role": "assistant", "content": blocks }));
                }
                Role::Tool => {
                    let block = serde_json::json!({
                        "type": "tool_result",
                        "tool_use_id": msg.tool_call_id.as_deref().unwrap_or_default(),
                        "content": msg.content,
                    });
                    if last_was_tool_result {
                        if let Some(blocks) = msgs
                            .last_mut()
                            .and_then(|prev| prev["content"].as_array_mut())
                        {
                            blocks.push(block);
                        }
                    } else {
                        msgs.push(serde_json::json!({ "role": "user", "content": [block] }));
                    }
                    last_was_tool_result = true;
                    continue;
                }
            }
            last_was_tool_result = false;
        }

        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": msgs,
        });

        if !system_parts.is_empty() {
            body["system"] = serde_json::json!(system_parts.join("\n\n"));
        }

        if !tools.is_empty() {
            let tool_defs: Vec<_> = tools.iter().map(to_claude_tool).collect();
            body["tools"] = serde_json::json!(tool_defs);
            if tool_choice == ToolChoice::None {
                body["tool_choice"] = serde_json::json!({ "type": "none" });
            }
        }

        body
    }

    /// Parse a non-streaming response.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<AiResponse, AiError> {
        let blocks = json["content"]
            .as_array()
            .ok_or_else(|| AiError::ParseError("no content blocks in response".to_string()))?;

        let content = blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let tool_calls = blocks
            .iter()
            .filter(|b| b["type"] == "tool_use")
            .map(|b| ToolCall {
                id: b["id"].as_str().unwrap_or("").to_string(),
                name: b["name"].as_str().unwrap_or("").to_string(),
                arguments: b["input"].clone(),
            })
            .collect();

        let usage = TokenUsage {
            input_tokens: json["usage"]["input_tokens"].as_u64().unwrap_or(0),
            output_tokens: json["usage"]["output_tokens"].as_u64().unwrap_or(0),
        };

        Ok(AiResponse {
            content,
            tool_calls,
            usage,
        })
    }
}
