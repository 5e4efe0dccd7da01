//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# chatdb configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[app]
# name = "Chat with DB"
# icon = "🤖"

[llm]
# provider = "openai"        # openai, anthropic, local

[openai]
# api_key = ""               # empty = $OPENAI_API_KEY
# model = "gpt-4o-mini"
# temperature = 0.0          # 0.0-2.0

[anthropic]
# api_key = ""               # empty = $ANTHROPIC_API_KEY
# model = "claude-sonnet-4-20250514"
# max_tokens = 4096          # 256-64000

[local]
# base_url = "http://localhost:1234/v1"
# model = "local-model"

[agent]
# tool_call_budget = 10      # SQL executions per question, 0-50
# max_rows = 5               # rows shown to the model per query, 1-1000
# query_timeout_secs = 30    # 1-600
# sample_rows = 3            # sample rows per table in the schema, 0-10

[logging]
# level = "INFO"             # DEBUG, INFO, WARNING, ERROR

# [[connections]]
# name = "sales"
# kind = "sqlite"
# path = "/path/to/sales.db"

# [[connections]]
# name = "warehouse"
# kind = "postgresql"
# host = "localhost"
# port = 5432
# user = "analyst"
# password_env = "WAREHOUSE_PASSWORD"
# database = "dw"
"##
    .to_string()
}
