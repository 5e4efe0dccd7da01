//! OpenAI client struct, request building, and response parsing.

use crate::tools::to_openai_tool;
use crate::{
    build_http_client, AiError, AiResponse, Message, Role, TokenUsage, ToolCall, ToolChoice,
    ToolDefinition,
};

use super::config::OpenAiConfig;

/// OpenAI-compatible chat client.
pub struct OpenAiClient {
    pub(crate) config: OpenAiConfig,
    pub(crate) http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, AiError> {
        Ok(Self {
            config,
            http: build_http_client()?,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub(crate) fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Build the JSON request body for the Chat Completions API.
    pub(crate) fn build_request_body(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> serde_json::Value {
        let msgs: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| match msg.role {
                Role::System => serde_json::json!({ "role": "system", "content": msg.content }),
                Role::User => serde_json::json!({ "role": "user", "content": msg.content }),
                Role::Assistant if msg.tool_calls.is_empty() => {
                    serde_json::json!({ "role": "assistant", "content": msg.content })
                }
                Role::Assistant => {
                    let calls: Vec<_> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            serde_json::json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    let content = if msg.content.is_empty() {
                        serde_json::Value::Null
                    } else {
                        serde_json::json!(msg.content)
                    };
                    serde_json::json!({ "role": "assistant", "content": content, "tool_calls": calls })
                }
                Role::Tool => serde_json::json!({
                    "role": "tool",
                    "tool_call_id": msg.tool_call_id.as_deref().unwrap_or_default(),
                    "content": msg.content,
                }),
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": msgs,
        });

        if !tools.is_empty() {
            let tool_defs: Vec<_> = tools.iter().map(to_openai_tool).collect();
            body["tools"] = serde_json::json!(tool_defs);
            body["tool_choice"] = match tool_choice {
                ToolChoice::Auto => serde_json::json!("auto"),
                ToolChoice::None => serde_json::json!("none"),
            };
        }

        body
    }

    /// Parse a Chat Completions response.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<AiResponse, AiError> {
        let message = json["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .map(|choice| &choice["message"])
            .ok_or_else(|| AiError::ParseError("no choices in response".to_string()))?;

        let content = message["content"].as_str().unwrap_or_default().to_string();

        let tool_calls = message["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .map(|call| {
                        let raw = call["function"]["arguments"].as_str().unwrap_or("{}");
                        ToolCall {
                            id: call["id"].as_str().unwrap_or("").to_string(),
                            name: call["function"]["name"].as_str().unwrap_or("").to_string(),
                            // Keep malformed arguments as a string so the caller can report them.
                            arguments: serde_json::from_str(raw)
                                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string())),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let usage = TokenUsage {
            input_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            output_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
        };

        Ok(AiResponse {
            content,
            tool_calls,
            usage,
        })
    }
}
