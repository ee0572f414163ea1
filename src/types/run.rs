use serde::{Deserialize, Serialize};

use crate::types::document::DocumentContent;
use crate::types::message::HistoryEntry;

/// Lifecycle state of one streamed run.
///
/// Transitions are `Created → Streaming → {Completed | Failed | Aborted}`;
/// terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// The run has been accepted by the backend but its stream is not open.
    Created,
    /// The event stream is being consumed.
    Streaming,
    /// The run produced a consolidated assistant message.
    Completed,
    /// The run failed after exhausting its retry budget.
    Failed,
    /// The run was cancelled by the caller or superseded.
    Aborted,
}

impl RunState {
    /// Returns true for states no run ever leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Aborted
        )
    }
}

/// Request body for starting a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunRequest {
    /// The user's message, non-empty after trimming.
    pub user_message: String,
    /// Read-only snapshot of the conversation so far.
    pub conversation_history: Vec<HistoryEntry>,
    /// Snapshot of the active document.
    pub document_content: DocumentContent,
    /// Session to continue, when one has been assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response to a start-run request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRunResponse {
    /// Backend-assigned identifier for the streamed execution.
    pub run_id: String,
    /// Session identifier, assigned on the first run and reused after.
    pub session_id: String,
}
