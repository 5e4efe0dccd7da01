//! Conversation session management.
//!
//! A `Session` holds the transcript of one interactive chat and the name of
//! the data source it is talking to. It hands the agent immutable snapshots
//! and appends each finished turn.

mod store;
mod types;


pub use store::Session;
pub use types::{Transcript, Turn, TurnRole};
