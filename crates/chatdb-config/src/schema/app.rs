//! Application identity shown in the chat header.

use serde::{Deserialize, Serialize};

/// Name and icon displayed when the chat starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfoConfig {
    pub name: String,
    pub icon: String,
}

impl Default for AppInfoConfig {
    fn default() -> Self {
        Self {
            name: "Chat with DB".into(),
            icon: "🤖".into(),
        }
    }
}
