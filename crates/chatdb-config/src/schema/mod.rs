//! Configuration schema types for chatdb.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Only `[[connections]]` entries carry required fields.

mod agent;
mod app;
mod connections;
mod llm;
mod system;

pub use agent::*;
pub use app::*;
pub use connections::*;
pub use llm::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for chatdb.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ChatDbConfig {
    pub app: AppInfoConfig,
    pub llm: LlmConfig,
    pub openai: OpenAiConfig,
    pub anthropic: AnthropicConfig,
    pub local: LocalLlmConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
    pub connections: Vec<ConnectionConfig>,
}

impl ChatDbConfig {
    /// Look up a connection by name.
    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.name == name)
    }
}

// =============================================================================
// Tests
// =============================================================================
