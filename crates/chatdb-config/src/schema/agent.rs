//! Query agent limits.

use serde::{Deserialize, Serialize};

/// `[agent]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// SQL executions allowed per question (valid range: 0-50).
    pub tool_call_budget: u32,
    /// Rows returned to the model per query (valid range: 1-1000).
    pub max_rows: u32,
    /// Per-query timeout in seconds (valid range: 1-600).
    pub query_timeout_secs: u32,
    /// Sample rows per table included in the schema description (valid range: 0-10).
    pub sample_rows: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tool_call_budget: 10,
            max_rows: 5,
            query_timeout_secs: 30,
            sample_rows: 3,
        }
    }
}
