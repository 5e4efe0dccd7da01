//! Question answering over SQL data sources.
//!
//! - [`Session`] keeps the chat transcript for one user session.
//! - [`QueryAgent`] answers one question with a bounded loop of
//!   model calls and read-only SQL executions.
//! - [`guard`] decides mechanically which statements may run.
//! - [`DataSource`] is the seam to the actual database.

pub mod agent;
pub mod error;
pub mod guard;
pub mod session;
pub mod source;

#[cfg(test)]
mod testing;

pub use agent::{AgentSettings, AnswerResult, QueryAgent, UsageReport};
pub use error::{AgentError, DataSourceError};
pub use guard::{validate_statement, StatementRejected};
pub use session::{Session, Transcript, Turn, TurnRole};
pub use source::{DataSource, QueryRows};
