//! The single SQL tool offered to the model.

use chatdb_ai::{ToolCall, ToolDefinition};

pub const SQL_QUERY_TOOL: &str = "sql_query";

pub fn sql_query_tool() -> ToolDefinition {
    ToolDefinition {
        name: SQL_QUERY_TOOL.to_string(),
        description: "Execute one read-only SQL query against the database and return the \
                      resulting rows. If the query is not correct, an error message is \
                      returned; rewrite the query and try again."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "A single SELECT statement"
                }
            },
            "required": ["query"]
        }),
    }
}

/// The SQL text of a tool call, or the reason it has none.
///
/// A bare string argument is taken as the query itself; some local models
/// send raw SQL instead of a JSON object.
pub(crate) fn query_argument(call: &ToolCall) -> Result<&str, String> {
    if call.name != SQL_QUERY_TOOL {
        return Err(format!(
            "unknown tool '{}'; the only tool is {SQL_QUERY_TOOL}",
            call.name
        ));
    }
    let query = match &call.arguments {
        serde_json::Value::String(raw) => Some(raw.as_str()),
        args => args.get("query").and_then(|q| q.as_str()),
    };
    match query {
        Some(q) if !q.trim().is_empty() => Ok(q.trim()),
        _ => Err("missing 'query' argument".to_string()),
    }
}
