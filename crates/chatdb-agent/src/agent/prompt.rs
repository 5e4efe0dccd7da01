//! Message construction for the reasoning steps.

use chatdb_ai::Message;

use crate::session::{Transcript, TurnRole};

use super::tools::SQL_QUERY_TOOL;

const PREAMBLE: &str = "You are a helpful assistant. Use the following chat history and tools \
                        to answer the user's questions.";

pub(crate) const BUDGET_EXHAUSTED_NOTE: &str = "You have used all the queries allowed for this \
    question. Do not request more. Answer now with what you have learned, and say so if the \
    answer is incomplete.";

/// System prompt for one invocation.
///
/// `schema` is `None` when the question must be answered without database
/// access.
pub(crate) fn system_prompt(
    dialect: &str,
    schema: Option<&str>,
    budget: u32,
    max_rows: usize,
) -> String {
    let Some(schema) = schema else {
        return format!(
            "{PREAMBLE}\n\nYou have no database access for this question. Answer from the \
             conversation so far, and say so if that is not enough."
        );
    };

    format!(
        "{PREAMBLE}\n\n\
         You are connected to a {dialect} database. Given a question, write a syntactically \
         correct {dialect} query, run it with the {SQL_QUERY_TOOL} tool, look at the results \
         and answer in plain language.\n\
         - Unless the user asks for a specific number of rows, limit every query to at most \
         {max_rows} results. Only the first {max_rows} rows of any result are shown to you.\n\
         - Never select all columns from a table; ask only for the relevant ones.\n\
         - Only read-only SELECT queries are allowed. Statements that modify data or schema \
         are rejected without being executed.\n\
         - You may run at most {budget} queries for this question; rejected queries count.\n\
         - If a query fails, read the error, rewrite the query and try again.\n\n\
         Database schema:\n{schema}"
    )
}

/// Opening messages: system prompt, prior turns, then the new question.
pub(crate) fn initial_messages(system: String, transcript: &Transcript, question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(transcript.len() + 2);
    messages.push(Message::system(system));
    for turn in transcript {
        messages.push(match turn.role() {
            TurnRole::User => Message::user(turn.text()),
            TurnRole::Assistant => Message::assistant(turn.text()),
        });
    }
    messages.push(Message::user(question));
    messages
}
