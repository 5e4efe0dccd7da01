use std::sync::Arc;
use std::time::Duration;

use chatdb_ai::{AiError, Role, ToolChoice};
use serde_json::json;

use super::*;
use crate::session::{Transcript, Turn};
use crate::source::QueryRows;
use crate::testing::{count_rows, sql_call, sql_calls, text, FakeSource, ScriptedClient};
use crate::{AgentError, DataSourceError};

fn agent(client: &Arc<ScriptedClient>) -> QueryAgent {
    QueryAgent::new(client.clone())
}

fn tool_results(messages: &[chatdb_ai::Message]) -> Vec<&str> {
    messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect()
}

#[tokio::test]
async fn counts_rows_with_one_query() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("SELECT COUNT(*) FROM orders")),
        Ok(text("There are 42 rows in the orders table.")),
    ]));
    let source = FakeSource::new(vec![Ok(count_rows(42))]);

    let result = agent(&client)
        .answer("How many rows are in orders?", &Transcript::default(), &source, 3)
        .await
        .unwrap();

    assert!(result.text.contains("42"));
    assert_eq!(result.tool_calls_used, 1);
    assert_eq!(source.executed(), vec!["SELECT COUNT(*) FROM orders"]);

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        tool_results(&requests[1].messages),
        vec!["Columns: COUNT(*)\n[(42,)]"]
    );
}

#[tokio::test]
async fn empty_question_is_a_hard_error() {
    let client = Arc::new(ScriptedClient::default());
    let source = FakeSource::new(Vec::new());

    let err = agent(&client)
        .answer("   ", &Transcript::default(), &source, 3)
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::EmptyQuestion));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn zero_budget_never_touches_the_database() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("SELECT 1")),
        Ok(text("unused")),
    ]));
    let source = FakeSource::new(vec![Ok(count_rows(1))]);

    let result = agent(&client)
        .answer("What did I ask before?", &Transcript::default(), &source, 0)
        .await
        .unwrap();

    assert_eq!(result.tool_calls_used, 0);
    assert!(source.executed().is_empty());
    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].tools.is_empty());
    assert!(requests[0].messages[0].content.contains("no database access"));
    assert!(!result.text.is_empty());
}

#[tokio::test]
async fn mutating_statements_are_rejected_without_executing() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("DELETE FROM orders")),
        Ok(sql_call("SELECT 1; DROP TABLE orders")),
        Ok(text("I can only read data.")),
    ]));
    let source = FakeSource::new(Vec::new());

    let result = agent(&client)
        .answer("Remove all orders", &Transcript::default(), &source, 5)
        .await
        .unwrap();

    assert!(source.executed().is_empty());
    assert_eq!(result.tool_calls_used, 2);
    let requests = client.requests();
    let results = tool_results(&requests[2].messages);
    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .all(|r| r.starts_with("Error: statement rejected without execution")));
}

#[tokio::test]
async fn invalid_statements_exhaust_budget_then_answer() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("DROP TABLE a")),
        Ok(sql_call("UPDATE a SET x = 1")),
        Ok(sql_call("INSERT INTO a VALUES (1)")),
    ]));
    let source = FakeSource::new(Vec::new());

    let result = agent(&client)
        .answer("Break things", &Transcript::default(), &source, 3)
        .await
        .unwrap();

    assert_eq!(result.tool_calls_used, 3);
    assert!(source.executed().is_empty());
    assert!(!result.text.is_empty());

    let requests = client.requests();
    assert_eq!(requests.len(), 4);
    let last = &requests[3];
    assert_eq!(last.tool_choice, ToolChoice::None);
    assert!(last
        .messages
        .iter()
        .any(|m| m.role == Role::System && m.content == super::prompt::BUDGET_EXHAUSTED_NOTE));
}

#[tokio::test]
async fn calls_beyond_budget_in_one_response_are_not_run() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_calls(&[
            "SELECT COUNT(*) FROM a",
            "SELECT COUNT(*) FROM b",
            "SELECT COUNT(*) FROM c",
        ])),
        Ok(text("a has 1 row, b has 2.")),
    ]));
    let source = FakeSource::new(vec![Ok(count_rows(1)), Ok(count_rows(2))]);

    let result = agent(&client)
        .answer("Count a, b and c", &Transcript::default(), &source, 2)
        .await
        .unwrap();

    assert_eq!(result.tool_calls_used, 2);
    assert_eq!(source.executed().len(), 2);
    let requests = client.requests();
    let results = tool_results(&requests[1].messages);
    assert_eq!(results.len(), 3);
    assert!(results[2].starts_with("Not executed"));
}

#[tokio::test]
async fn used_never_exceeds_budget() {
    for budget in 0..4u32 {
        let client = Arc::new(ScriptedClient::new(
            (0..6).map(|_| Ok(sql_call("SELECT 1"))).collect(),
        ));
        let source = FakeSource::new(Vec::new());

        let result = agent(&client)
            .answer("Loop forever", &Transcript::default(), &source, budget)
            .await
            .unwrap();

        assert!(result.tool_calls_used <= budget);
        assert_eq!(source.executed().len() as u32, result.tool_calls_used);
    }
}

#[tokio::test]
async fn unreachable_database_ends_turn_with_apology() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("SELECT COUNT(*) FROM orders")),
        Ok(text("should not be asked")),
    ]));
    let source = FakeSource::new(vec![Err(DataSourceError::Unavailable(
        "connection refused".into(),
    ))]);

    let result = agent(&client)
        .answer("How many orders?", &Transcript::default(), &source, 3)
        .await
        .unwrap();

    assert!(result.text.starts_with("Sorry"));
    assert!(result.text.contains("connection refused"));
    assert_eq!(result.tool_calls_used, 1);
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn unreachable_schema_apologises_before_asking() {
    let client = Arc::new(ScriptedClient::default());
    let source = FakeSource::new(Vec::new())
        .with_schema(Err(DataSourceError::Unavailable("no such host".into())));

    let result = agent(&client)
        .answer("How many orders?", &Transcript::default(), &source, 3)
        .await
        .unwrap();

    assert!(result.text.contains("no such host"));
    assert_eq!(result.tool_calls_used, 0);
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn schema_query_error_is_not_fatal() {
    let client = Arc::new(ScriptedClient::new(vec![Ok(text("Fine."))]));
    let source =
        FakeSource::new(Vec::new()).with_schema(Err(DataSourceError::Query("denied".into())));

    let result = agent(&client)
        .answer("Anything?", &Transcript::default(), &source, 3)
        .await
        .unwrap();

    assert_eq!(result.text, "Fine.");
    assert!(client.requests()[0].messages[0]
        .content
        .contains("schema could not be loaded"));
}

#[tokio::test]
async fn query_errors_are_fed_back_for_a_retry() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("SELECT COUNT(*) FROM order")),
        Ok(sql_call("SELECT COUNT(*) FROM orders")),
        Ok(text("42 orders.")),
    ]));
    let source = FakeSource::new(vec![
        Err(DataSourceError::Query("no such table: order".into())),
        Ok(count_rows(42)),
    ]);

    let result = agent(&client)
        .answer("How many orders?", &Transcript::default(), &source, 3)
        .await
        .unwrap();

    assert_eq!(result.text, "42 orders.");
    assert_eq!(result.tool_calls_used, 2);
    let requests = client.requests();
    assert!(tool_results(&requests[1].messages)[0].contains("no such table: order"));
}

#[tokio::test]
async fn slow_query_times_out_and_is_fed_back() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("SELECT COUNT(*) FROM huge")),
        Ok(text("That query took too long.")),
    ]));
    let source = FakeSource::new(vec![Ok(count_rows(1))]).with_delay(Duration::from_millis(500));
    let agent = agent(&client).with_settings(AgentSettings {
        max_rows: 5,
        query_timeout: Duration::from_millis(20),
    });

    let result = agent
        .answer("How big is huge?", &Transcript::default(), &source, 2)
        .await
        .unwrap();

    assert_eq!(result.text, "That query took too long.");
    assert_eq!(result.tool_calls_used, 1);
    let requests = client.requests();
    assert!(tool_results(&requests[1].messages)[0].contains("timed out"));
}

#[tokio::test]
async fn rows_are_capped_before_the_model_sees_them() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("SELECT id FROM orders")),
        Ok(text("Here are some ids.")),
    ]));
    let many = QueryRows::new(vec!["id".into()], (0..20).map(|i| vec![json!(i)]).collect());
    let source = FakeSource::new(vec![Ok(many)]);

    agent(&client)
        .answer("List orders", &Transcript::default(), &source, 1)
        .await
        .unwrap();

    let requests = client.requests();
    let result = tool_results(&requests[1].messages)[0];
    assert!(result.contains("(0,), (1,), (2,), (3,), (4,)]"));
    assert!(result.contains("only the first 5 rows"));
}

#[tokio::test]
async fn provider_error_becomes_apology() {
    let client = Arc::new(ScriptedClient::new(vec![Err(AiError::RateLimited)]));
    let source = FakeSource::new(Vec::new());

    let result = agent(&client)
        .answer("How many orders?", &Transcript::default(), &source, 3)
        .await
        .unwrap();

    assert!(result.text.starts_with("Oops!"));
    assert_eq!(result.tool_calls_used, 0);
}

#[tokio::test]
async fn unknown_tool_consumes_budget_without_running() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(chatdb_ai::AiResponse {
            content: String::new(),
            tool_calls: vec![chatdb_ai::ToolCall {
                id: "x".into(),
                name: "shell".into(),
                arguments: json!({ "cmd": "rm -rf /" }),
            }],
            usage: Default::default(),
        }),
        Ok(text("No.")),
    ]));
    let source = FakeSource::new(Vec::new());

    let result = agent(&client)
        .answer("Do it", &Transcript::default(), &source, 2)
        .await
        .unwrap();

    assert_eq!(result.tool_calls_used, 1);
    assert!(source.executed().is_empty());
    assert!(tool_results(&client.requests()[1].messages)[0].contains("unknown tool"));
}

#[tokio::test]
async fn transcript_and_question_reach_the_model() {
    let client = Arc::new(ScriptedClient::new(vec![Ok(text("You asked about orders."))]));
    let source = FakeSource::new(Vec::new());
    let transcript = Transcript::new(vec![
        Turn::user("How many orders?"),
        Turn::assistant("42."),
    ]);

    agent(&client)
        .answer("  What did I ask?  ", &transcript, &source, 0)
        .await
        .unwrap();

    let messages = &client.requests()[0].messages;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].content, "How many orders?");
    assert_eq!(messages[2].content, "42.");
    assert_eq!(messages[3].content, "What did I ask?");
}

#[tokio::test]
async fn usage_is_tracked_per_question() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sql_call("SELECT 1")),
        Ok(text("1")),
    ]));
    let source = FakeSource::new(Vec::new());
    let agent = agent(&client);

    agent
        .answer("One?", &Transcript::default(), &source, 1)
        .await
        .unwrap();

    let report = agent.usage();
    assert_eq!(report.questions, 1);
    assert_eq!(report.model_calls, 2);
    assert_eq!(report.total.total_tokens(), 30);

    agent
        .answer("Again?", &Transcript::default(), &source, 0)
        .await
        .unwrap();
    let report = agent.usage();
    assert_eq!(report.questions, 2);
    assert_eq!(report.model_calls, 3);
    assert_eq!(report.last_question.total_tokens(), 15);
    assert_eq!(report.tokens_per_question(), 22);
}

#[tokio::test]
async fn bare_string_arguments_are_taken_as_sql() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(chatdb_ai::AiResponse {
            content: String::new(),
            tool_calls: vec![chatdb_ai::ToolCall {
                id: "raw".into(),
                name: SQL_QUERY_TOOL.into(),
                arguments: json!("SELECT COUNT(*) FROM orders"),
            }],
            usage: Default::default(),
        }),
        Ok(text("42")),
    ]));
    let source = FakeSource::new(vec![Ok(count_rows(42))]);

    agent(&client)
        .answer("Count", &Transcript::default(), &source, 1)
        .await
        .unwrap();

    assert_eq!(source.executed(), vec!["SELECT COUNT(*) FROM orders"]);
}
