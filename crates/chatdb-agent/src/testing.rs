//! Scripted model and data source used by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chatdb_ai::{AiClient, AiError, AiResponse, Message, TokenUsage, ToolCall, ToolChoice, ToolDefinition};
use serde_json::json;

use crate::source::{DataSource, QueryRows};
use crate::DataSourceError;

/// What the agent sent on one model call.
#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: ToolChoice,
}

/// Replays queued responses in order; an empty queue yields empty text.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    responses: Mutex<VecDeque<Result<AiResponse, AiError>>>,
    requests: Mutex<Vec<Request>>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<AiResponse, AiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiClient for ScriptedClient {
    fn provider(&self) -> &str {
        "scripted"
    }

    async fn send_message(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AiResponse, AiError> {
        self.requests.lock().unwrap().push(Request {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            tool_choice,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(text("")))
    }
}

fn usage() -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: 5,
    }
}

pub(crate) fn text(content: &str) -> AiResponse {
    AiResponse {
        content: content.to_string(),
        tool_calls: Vec::new(),
        usage: usage(),
    }
}

pub(crate) fn sql_calls(queries: &[&str]) -> AiResponse {
    AiResponse {
        content: String::new(),
        tool_calls: queries
            .iter()
            .enumerate()
            .map(|(i, q)| ToolCall {
                id: format!("call_{i}"),
                name: "sql_query".to_string(),
                arguments: json!({ "query": q }),
            })
            .collect(),
        usage: usage(),
    }
}

pub(crate) fn sql_call(query: &str) -> AiResponse {
    sql_calls(&[query])
}

/// In-memory source that records every statement it is asked to run.
pub(crate) struct FakeSource {
    schema: Result<String, DataSourceError>,
    results: Mutex<VecDeque<Result<QueryRows, DataSourceError>>>,
    executed: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl FakeSource {
    pub fn new(results: Vec<Result<QueryRows, DataSourceError>>) -> Self {
        Self {
            schema: Ok("CREATE TABLE orders (id INTEGER PRIMARY KEY, total REAL)".to_string()),
            results: Mutex::new(results.into()),
            executed: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_schema(mut self, schema: Result<String, DataSourceError>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for FakeSource {
    fn dialect(&self) -> &str {
        "SQLite"
    }

    async fn execute_read_only_query(&self, sql: &str) -> Result<QueryRows, DataSourceError> {
        self.executed.lock().unwrap().push(sql.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryRows::default()))
    }

    async fn describe_schema(&self) -> Result<String, DataSourceError> {
        self.schema.clone()
    }
}

pub(crate) fn count_rows(n: i64) -> QueryRows {
    QueryRows::new(vec!["COUNT(*)".to_string()], vec![vec![json!(n)]])
}
