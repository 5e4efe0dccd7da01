//! Full configuration validation.
//!
//! Each domain has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod agent;
mod connections;
mod helpers;
mod llm;


use crate::schema::ChatDbConfig;
use chatdb_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ChatDbConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    llm::validate_llm(&mut errors, config);
    agent::validate_agent(&mut errors, config);
    connections::validate_connections(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
