//! Tool definition conversion into each provider's wire format.

use crate::ToolDefinition;

/// Convert a tool definition to the Anthropic Messages API format.
pub fn to_claude_tool(tool: &ToolDefinition) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.parameters,
    })
}

/// Convert a tool definition to the OpenAI Chat Completions format.
pub fn to_openai_tool(tool: &ToolDefinition) -> serde_json::Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ToolDefinition {
        ToolDefinition {
            name: "sql_query".into(),
            description: "Run a query".into(),
            parameters: serde_json::json!({ "type": "object" }),
        }
    }

    #[test]
    fn claude_format_uses_input_schema() {
        let json = to_claude_tool(&sample());
        assert_eq!(json["name"], "sql_query");
        assert_eq!(json["input_schema"]["type"], "object");
        assert!(json.get("parameters").is_none());
    }

    #[test]
    fn openai_format_wraps_function() {
        let json = to_openai_tool(&sample());
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "sql_query");
        assert_eq!(json["function"]["parameters"]["type"], "object");
    }
}
