//! Provider selection from `[llm]`.

use std::sync::Arc;

use chatdb_ai::{AiClient, AiError, ClaudeClient, ClaudeConfig, OpenAiClient, OpenAiConfig};
use chatdb_config::schema::{ChatDbConfig, LlmProvider};
use tracing::info;

/// Build the client for the configured provider.
pub fn build_client(config: &ChatDbConfig) -> Result<Arc<dyn AiClient>, AiError> {
    let client: Arc<dyn AiClient> = match config.llm.provider {
        LlmProvider::OpenAi => {
            let settings = OpenAiConfig::from_key_or_env(&config.openai.api_key)?
                .with_model(&config.openai.model)
                .with_temperature(config.openai.temperature);
            let client = OpenAiClient::new(settings)?;
            info!(model = client.model(), "Using OpenAI");
            Arc::new(client)
        }
        LlmProvider::Anthropic => {
            let settings = ClaudeConfig::from_key_or_env(&config.anthropic.api_key)?
                .with_model(&config.anthropic.model)
                .with_max_tokens(config.anthropic.max_tokens);
            let client = ClaudeClient::new(settings)?;
            info!(model = client.model(), "Using Anthropic");
            Arc::new(client)
        }
        LlmProvider::Local => {
            let settings =
                OpenAiConfig::local(&config.local.base_url).with_model(&config.local.model);
            let client = OpenAiClient::new(settings)?;
            info!(model = client.model(), base_url = %config.local.base_url, "Using local model");
            Arc::new(client)
        }
    };
    Ok(client)
}
