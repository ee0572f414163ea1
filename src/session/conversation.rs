//! The conversation state reducer.
//!
//! [`Conversation`] owns the authoritative message history and session
//! identity. It performs no I/O and never fails: invalid operations (an undo
//! with no snapshot, an expired snapshot) are no-ops. The streaming side of
//! the crate only produces values; appending them here is the caller's job,
//! which keeps a single owner for all durable conversation state.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// Default grace window for undoing a clear.
const DEFAULT_UNDO_GRACE: Duration = Duration::from_secs(10);

/// The durable, ordered conversation state.
#[derive(Debug)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    session_id: Option<String>,
    snapshot: Option<ClearSnapshot>,
    undo_grace: Duration,
}

/// State saved by `clear()` so it can be undone inside the grace window.
#[derive(Debug)]
struct ClearSnapshot {
    messages: Vec<ChatMessage>,
    session_id: Option<String>,
    taken_at: Instant,
}

/// Serializable transcript of a conversation.
///
/// The reducer itself keeps no on-disk state; callers that want persistence
/// serialize this and write it wherever they like.
#[derive(Debug, Serialize, Deserialize)]
pub struct Transcript {
    version: u8,
    /// Session id at the time the transcript was taken.
    pub session_id: Option<String>,
    /// The full message list, in order.
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Creates an empty conversation with the default undo grace window.
    pub fn new() -> Self {
        Self::with_undo_grace(DEFAULT_UNDO_GRACE)
    }

    /// Creates an empty conversation with a custom undo grace window.
    pub fn with_undo_grace(undo_grace: Duration) -> Self {
        Self {
            messages: Vec::new(),
            session_id: None,
            snapshot: None,
            undo_grace,
        }
    }

    /// Appends a finalized message at the end of the history.
    ///
    /// Order equals call order; messages are never reordered or deduplicated.
    pub fn append_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Sets or overwrites the session id.
    pub fn update_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    /// The current session id, if one has been assigned.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The most recent `limit` messages (all when `None`), oldest first.
    pub fn history(&self, limit: Option<usize>) -> &[ChatMessage] {
        match limit {
            Some(limit) => {
                let start = self.messages.len().saturating_sub(limit);
                &self.messages[start..]
            }
            None => &self.messages,
        }
    }

    /// The full message list, in insertion order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when no messages have been exchanged.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Atomically empties the message list and session id.
    ///
    /// The prior state is snapshotted and stays restorable via [`undo`]
    /// until the grace window elapses. A second clear replaces the snapshot.
    ///
    /// [`undo`]: Conversation::undo
    pub fn clear(&mut self) {
        self.snapshot = Some(ClearSnapshot {
            messages: std::mem::take(&mut self.messages),
            session_id: self.session_id.take(),
            taken_at: Instant::now(),
        });
    }

    /// Restores the state saved by the last [`clear`], if still inside the
    /// grace window.
    ///
    /// Returns true when state was restored. With no snapshot, or once the
    /// window has elapsed (the snapshot is discarded on access), this is a
    /// no-op returning false.
    ///
    /// [`clear`]: Conversation::clear
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.snapshot.take() else {
            return false;
        };
        if snapshot.taken_at.elapsed() > self.undo_grace {
            return false;
        }
        self.messages = snapshot.messages;
        self.session_id = snapshot.session_id;
        true
    }

    /// Returns true while the last clear is still undoable.
    pub fn can_undo(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|s| s.taken_at.elapsed() <= self.undo_grace)
    }

    /// Takes a serializable transcript of the current state.
    pub fn transcript(&self) -> Transcript {
        Transcript {
            version: 1,
            session_id: self.session_id.clone(),
            messages: self.messages.clone(),
        }
    }

    /// Replaces the current state with a previously taken transcript.
    pub fn restore_transcript(&mut self, transcript: Transcript) {
        self.messages = transcript.messages;
        self.session_id = transcript.session_id;
        self.snapshot = None;
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
