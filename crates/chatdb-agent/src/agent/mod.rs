//! The query agent: a bounded reasoning loop over one data source.
//!
//! Each question runs as a small state machine:
//!
//! ```text
//! Idle -> Reasoning -> Executing -> Reasoning -> ... -> Answered
//! ```
//!
//! Every requested SQL execution consumes one unit of the tool-call
//! budget, whether it runs or is rejected by the guard. Once the budget is
//! spent the next model call may not use tools and its text is final.

mod prompt;
mod runner;
mod tools;
mod usage;

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chatdb_ai::{AiClient, TokenUsage};

pub use tools::{sql_query_tool, SQL_QUERY_TOOL};
pub use usage::UsageReport;

use usage::UsageLedger;

/// Limits applied to every invocation.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Rows shown to the model per query.
    pub max_rows: usize,
    /// Upper bound on a single query execution.
    pub query_timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rows: 5,
            query_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of one question. Failures are explained in `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub text: String,
    pub tool_calls_used: u32,
}

/// Answers questions with a language model and read-only SQL.
pub struct QueryAgent {
    client: Arc<dyn AiClient>,
    settings: AgentSettings,
    ledger: Mutex<UsageLedger>,
}

impl QueryAgent {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self {
            client,
            settings: AgentSettings::default(),
            ledger: Mutex::new(UsageLedger::default()),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn provider(&self) -> &str {
        self.client.provider()
    }

    /// Token spend across every question this agent has answered.
    pub fn usage(&self) -> UsageReport {
        self.ledger().report()
    }

    fn begin_question(&self) {
        self.ledger().begin_question();
    }

    fn record_usage(&self, usage: &TokenUsage) {
        self.ledger().record(usage);
    }

    fn ledger(&self) -> MutexGuard<'_, UsageLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }
}
