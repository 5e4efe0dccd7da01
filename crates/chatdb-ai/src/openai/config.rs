//! OpenAI-compatible client configuration.

use crate::AiError;

pub(crate) const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Placeholder key sent to local servers, which ignore it.
const LOCAL_API_KEY: &str = "lm-studio";

/// OpenAI-compatible client configuration.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    /// Provider name reported to token accounting ("openai" or "local").
    pub provider: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("provider", &self.provider)
            .finish()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_BASE.to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            provider: "openai".to_string(),
        }
    }

    /// Use `api_key` when non-empty, otherwise `OPENAI_API_KEY`.
    pub fn from_key_or_env(api_key: &str) -> Result<Self, AiError> {
        if !api_key.trim().is_empty() {
            return Ok(Self::new(api_key.trim()));
        }
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(AiError::ApiError(
                "OpenAI API not configured. Set openai.api_key or OPENAI_API_KEY.".into(),
            )),
        }
    }

    /// Config for a local OpenAI-compatible server.
    pub fn local(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            provider: "local".to_string(),
            ..Self::new(LOCAL_API_KEY)
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}
