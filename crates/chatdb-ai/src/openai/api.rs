//! AiClient trait implementation for OpenAiClient.

use async_trait::async_trait;
use tracing::debug;

use crate::{check_status, AiClient, AiError, AiResponse, Message, ToolChoice, ToolDefinition};

use super::client::OpenAiClient;

#[async_trait]
impl AiClient for OpenAiClient {
    fn provider(&self) -> &str {
        &self.config.provider
    }

    async fn send_message(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AiResponse, AiError> {
        let body = self.build_request_body(messages, tools, tool_choice);

        debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            messages = messages.len(),
            "Chat completions request"
        );

        let response = self
            .http
            .post(self.api_url())
            .bearer_auth(&self.config.api_key)
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
