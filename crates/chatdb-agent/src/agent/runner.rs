//! The bounded reasoning loop behind [`QueryAgent::answer`].

use chatdb_ai::{AiError, Message, ToolCall, ToolChoice, ToolDefinition};
use chatdb_common::new_correlation_id;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::guard::validate_statement;
use crate::session::Transcript;
use crate::source::DataSource;
use crate::{AgentError, DataSourceError};

use super::prompt::{initial_messages, system_prompt, BUDGET_EXHAUSTED_NOTE};
use super::tools::{query_argument, sql_query_tool};
use super::{AnswerResult, QueryAgent};

const NOT_EXECUTED: &str = "Not executed: the query budget for this question is exhausted.";

const EXHAUSTED_FALLBACK: &str = "I couldn't work out a confident answer within the number of \
    queries allowed for this question. Try rephrasing it or allowing more queries.";

const EMPTY_FALLBACK: &str = "I don't have an answer for that. Could you rephrase the question?";

const SCHEMA_UNAVAILABLE: &str = "(the schema could not be loaded; inspect the catalog tables \
    with a query if you need it)";

/// Next thing the loop does.
enum Step {
    /// Call the model with the messages so far.
    Ask,
    /// Run the tool calls the model just requested.
    Execute(Vec<ToolCall>),
    /// Done; this is the answer text.
    Final(String),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Ask => "reasoning",
            Step::Execute(_) => "executing",
            Step::Final(_) => "answered",
        }
    }
}

/// Transient state of one question.
struct Invocation<'a> {
    source: &'a dyn DataSource,
    budget: u32,
    remaining: u32,
    used: u32,
    messages: Vec<Message>,
    tools: Vec<ToolDefinition>,
    exhausted_noted: bool,
}

impl Invocation<'_> {
    fn exhausted(&self) -> bool {
        self.budget > 0 && self.remaining == 0
    }

    fn result(&self, text: impl Into<String>) -> AnswerResult {
        AnswerResult {
            text: text.into(),
            tool_calls_used: self.used,
        }
    }
}

/// Why a tool call ended the whole turn.
struct Unreachable(String);

impl QueryAgent {
    /// Answer `question` using at most `tool_call_budget` SQL executions.
    ///
    /// Only an empty question is an error. Failed queries, an unreachable
    /// database and provider errors all come back as explanatory text.
    pub async fn answer(
        &self,
        question: &str,
        transcript: &Transcript,
        source: &dyn DataSource,
        tool_call_budget: u32,
    ) -> Result<AnswerResult, AgentError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AgentError::EmptyQuestion);
        }
        self.begin_question();

        let span = info_span!(
            "answer",
            cid = %new_correlation_id(),
            provider = self.client.provider(),
            budget = tool_call_budget,
        );
        Ok(self
            .run(question, transcript, source, tool_call_budget)
            .instrument(span)
            .await)
    }

    async fn run(
        &self,
        question: &str,
        transcript: &Transcript,
        source: &dyn DataSource,
        budget: u32,
    ) -> AnswerResult {
        info!(dialect = source.dialect(), history = transcript.len(), "Question received");

        let schema = if budget > 0 {
            match self.load_schema(source).await {
                Ok(schema) => Some(schema),
                Err(Unreachable(reason)) => {
                    warn!(%reason, "Data source unreachable");
                    return AnswerResult {
                        text: unreachable_text(&reason),
                        tool_calls_used: 0,
                    };
                }
            }
        } else {
            None
        };

        let system = system_prompt(source.dialect(), schema.as_deref(), budget, self.settings.max_rows);
        let mut inv = Invocation {
            source,
            budget,
            remaining: budget,
            used: 0,
            messages: initial_messages(system, transcript, question),
            tools: if budget > 0 { vec![sql_query_tool()] } else { Vec::new() },
            exhausted_noted: false,
        };

        let mut step = Step::Ask;
        loop {
            debug!(state = step.name(), remaining = inv.remaining, used = inv.used, "Agent state");
            step = match step {
                Step::Ask => match self.reason(&mut inv).await {
                    Ok(next) => next,
                    Err(e) => {
                        warn!(error = %e, "Model call failed");
                        return inv.result(format!(
                            "Oops! Something went wrong while thinking: {e}. Please try again."
                        ));
                    }
                },
                Step::Execute(calls) => match self.execute(&mut inv, calls).await {
                    Ok(()) => Step::Ask,
                    Err(Unreachable(reason)) => {
                        warn!(%reason, "Data source unreachable");
                        return inv.result(unreachable_text(&reason));
                    }
                },
                Step::Final(text) => {
                    info!(used = inv.used, "Question answered");
                    return inv.result(text);
                }
            };
        }
    }

    /// Schema text for the prompt. Anything short of an unreachable
    /// database is logged and replaced by a placeholder.
    async fn load_schema(&self, source: &dyn DataSource) -> Result<String, Unreachable> {
        let described = tokio::time::timeout(self.settings.query_timeout, source.describe_schema()).await;
        match described {
            Ok(Ok(schema)) => Ok(schema),
            Ok(Err(DataSourceError::Unavailable(reason))) => Err(Unreachable(reason)),
            Ok(Err(e)) => {
                warn!(error = %e, "Could not describe schema");
                Ok(SCHEMA_UNAVAILABLE.to_string())
            }
            Err(_) => {
                warn!("Describing the schema timed out");
                Ok(SCHEMA_UNAVAILABLE.to_string())
            }
        }
    }

    /// One model call. Tools are offered while budget remains; once it is
    /// spent they stay declared but may not be called.
    async fn reason(&self, inv: &mut Invocation<'_>) -> Result<Step, AiError> {
        if inv.exhausted() && !inv.exhausted_noted {
            inv.messages.push(Message::system(BUDGET_EXHAUSTED_NOTE));
            inv.exhausted_noted = true;
        }
        let choice = if inv.remaining > 0 {
            ToolChoice::Auto
        } else {
            ToolChoice::None
        };

        let response = self
            .client
            .send_message(&inv.messages, &inv.tools, choice)
            .await?;
        self.record_usage(&response.usage);
        debug!(
            tool_calls = response.tool_calls.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Model responded"
        );

        if !response.tool_calls.is_empty() {
            if inv.remaining > 0 {
                inv.messages.push(Message::assistant_with_tools(
                    response.content,
                    response.tool_calls.clone(),
                ));
                return Ok(Step::Execute(response.tool_calls));
            }
            warn!(
                count = response.tool_calls.len(),
                "Ignoring tool calls requested without budget"
            );
        }

        let text = response.content.trim();
        if !text.is_empty() {
            Ok(Step::Final(text.to_string()))
        } else if inv.exhausted() {
            Ok(Step::Final(EXHAUSTED_FALLBACK.to_string()))
        } else {
            Ok(Step::Final(EMPTY_FALLBACK.to_string()))
        }
    }

    /// Run each requested call in order, one budget unit apiece. Calls past
    /// the remaining budget are answered without running.
    async fn execute(&self, inv: &mut Invocation<'_>, calls: Vec<ToolCall>) -> Result<(), Unreachable> {
        for call in calls {
            if inv.remaining == 0 {
                debug!(call = %call.id, "Skipping tool call past budget");
                inv.messages.push(Message::tool_result(call.id, NOT_EXECUTED));
                continue;
            }
            inv.remaining -= 1;
            inv.used += 1;

            let output = self.run_tool(inv.source, &call).await?;
            inv.messages.push(Message::tool_result(call.id, output));
        }
        Ok(())
    }

    /// Tool result text for one call.
    async fn run_tool(&self, source: &dyn DataSource, call: &ToolCall) -> Result<String, Unreachable> {
        let sql = match query_argument(call) {
            Ok(sql) => sql,
            Err(reason) => {
                debug!(tool = %call.name, %reason, "Malformed tool call");
                return Ok(format!("Error: {reason}"));
            }
        };

        if let Err(rejected) = validate_statement(sql) {
            warn!(sql, reason = %rejected, "Statement rejected");
            return Ok(format!(
                "Error: statement rejected without execution: {rejected}. \
                 Only a single read-only SELECT query is allowed."
            ));
        }

        debug!(sql, "Executing query");
        let timeout = self.settings.query_timeout;
        let outcome = match tokio::time::timeout(timeout, source.execute_read_only_query(sql)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DataSourceError::Timeout(timeout)),
        };

        match outcome {
            Ok(mut rows) => {
                rows.cap(self.settings.max_rows);
                debug!(rows = rows.rows.len(), truncated = rows.truncated, "Query returned");
                Ok(rows.render())
            }
            Err(DataSourceError::Unavailable(reason)) => Err(Unreachable(reason)),
            Err(e @ DataSourceError::Timeout(_)) => {
                warn!(sql, "Query timed out");
                Ok(format!("Error: {e}. Try a simpler query or add a LIMIT."))
            }
            Err(DataSourceError::Query(message)) => {
                debug!(sql, %message, "Query failed");
                Ok(format!("Error: {message}. Rewrite the query and try again."))
            }
        }
    }
}

fn unreachable_text(reason: &str) -> String {
    format!(
        "Sorry, I couldn't reach the database to answer that ({reason}). \
         Please check the connection and try again."
    )
}
