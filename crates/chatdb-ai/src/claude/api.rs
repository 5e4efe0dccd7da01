//! AiClient trait implementation for ClaudeClient.

use async_trait::async_trait;
use tracing::debug;

use crate::{check_status, AiClient, AiError, AiResponse, Message, ToolChoice, ToolDefinition};

use super::client::{ClaudeClient, ANTHROPIC_API_URL};

#[async_trait]
impl AiClient for ClaudeClient {
    fn provider(&self) -> &str {
        "anthropic"
    }

    async fn send_message(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AiResponse, AiError> {
        let body = self.build_request_body(messages, tools, tool_choice);

        debug!(model = %self.config.model, messages = messages.len(), "Claude API request");

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await?;

        let json: serde_json::Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        self.parse_response(json)
    }
}
