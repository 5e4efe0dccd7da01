//! Session struct: transcript storage and the per-question round trip.

use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, MutexGuard};

use chatdb_common::SessionId;
use tracing::{debug, info, warn};

use crate::agent::{AnswerResult, QueryAgent};
use crate::source::DataSource;
use crate::AgentError;

use super::types::{BusyGuard, Transcript, Turn, TurnRole};

/// One interactive chat: its transcript and selected data source.
///
/// All methods take `&self`; a session can be shared between tasks, while
/// the busy guard keeps at most one question in flight.
pub struct Session {
    id: SessionId,
    turns: Mutex<Vec<Turn>>,
    data_source: Mutex<Option<String>>,
    busy: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            turns: Mutex::new(Vec::new()),
            data_source: Mutex::new(None),
            busy: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    fn turns(&self) -> MutexGuard<'_, Vec<Turn>> {
        self.turns.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a turn at the end. Blank user turns are dropped.
    pub fn append(&self, turn: Turn) {
        if turn.role() == TurnRole::User && turn.text().trim().is_empty() {
            warn!(session = %self.id, "Ignoring empty user turn");
            return;
        }
        self.turns().push(turn);
    }

    /// Clear the transcript. Idempotent.
    pub fn reset(&self) {
        self.turns().clear();
        debug!(session = %self.id, "Transcript reset");
    }

    /// Owned copy of the transcript as it is now.
    pub fn snapshot(&self) -> Transcript {
        Transcript::new(self.turns().clone())
    }

    pub fn len(&self) -> usize {
        self.turns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns().is_empty()
    }

    /// Name of the selected data source.
    pub fn data_source(&self) -> Option<String> {
        self.data_source
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Select a data source. Switching to a different one starts a new chat.
    pub fn select_data_source(&self, name: impl Into<String>) {
        let name = name.into();
        let mut current = self.data_source.lock().unwrap_or_else(|e| e.into_inner());
        if current.as_deref() == Some(name.as_str()) {
            return;
        }
        info!(session = %self.id, data_source = %name, "Data source selected");
        *current = Some(name);
        drop(current);
        self.reset();
    }

    /// Answer `question` against `source` and record both turns.
    ///
    /// The agent sees the transcript as it was before the question. Turns
    /// are appended only when `answer` returns, so a failed precondition
    /// leaves the transcript untouched.
    pub async fn ask(
        &self,
        agent: &QueryAgent,
        source: &dyn DataSource,
        question: &str,
        tool_call_budget: u32,
    ) -> Result<AnswerResult, AgentError> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let transcript = self.snapshot();
        let result = agent
            .answer(question, &transcript, source, tool_call_budget)
            .await?;

        self.append(Turn::user(question.trim()));
        self.append(Turn::assistant(result.text.clone()));
        Ok(result)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
