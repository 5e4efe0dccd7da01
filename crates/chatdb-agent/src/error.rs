use std::time::Duration;

/// Hard failures of a question. Everything else is folded into the answer text.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("session is busy with another question")]
    SessionBusy,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DataSourceError {
    /// The database cannot be reached at all; ends the turn.
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    /// The statement failed; the model gets a chance to fix it.
    #[error("query failed: {0}")]
    Query(String),

    #[error("query timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}
