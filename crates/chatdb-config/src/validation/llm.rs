//! Validation for the provider sections.

use crate::schema::{ChatDbConfig, LlmProvider};

use super::helpers::in_range;

pub(crate) fn validate_llm(errors: &mut Vec<String>, config: &ChatDbConfig) {
    in_range(errors, "openai.temperature", config.openai.temperature, 0.0..=2.0);
    in_range(errors, "anthropic.max_tokens", config.anthropic.max_tokens, 256..=64000);

    if config.llm.provider == LlmProvider::Local && config.local.base_url.trim().is_empty() {
        errors.push("local.base_url is required when llm.provider = \"local\"".into());
    }
}
