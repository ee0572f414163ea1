use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Role of a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message authored by the user.
    User,
    /// A message authored by the drafting assistant.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One exchanged conversational turn.
///
/// Messages are created once (on submit for user turns, on stream completion
/// for assistant turns) and never mutated afterwards; the conversation
/// reducer owns the only list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the turn.
    pub role: Role,
    /// The final, non-streaming text body.
    pub content: String,
    /// Creation time, immutable once set.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
    /// Transient reasoning lines captured while the turn was generated.
    /// Only present on assistant messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<Vec<String>>,
    /// Whether the thoughts panel renders expanded.
    #[serde(default = "default_expanded")]
    pub thoughts_expanded: bool,
}

fn default_expanded() -> bool {
    true
}

impl ChatMessage {
    /// Creates a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: OffsetDateTime::now_utc(),
            thoughts: None,
            thoughts_expanded: true,
        }
    }

    /// Creates an assistant message stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: OffsetDateTime::now_utc(),
            thoughts: None,
            thoughts_expanded: true,
        }
    }

    /// Attaches the thoughts captured during generation.
    pub fn with_thoughts(mut self, thoughts: Vec<String>) -> Self {
        self.thoughts = if thoughts.is_empty() {
            None
        } else {
            Some(thoughts)
        };
        self
    }

    /// Sets the thoughts-panel display preference.
    pub fn with_thoughts_expanded(mut self, expanded: bool) -> Self {
        self.thoughts_expanded = expanded;
        self
    }
}

/// A single history entry as sent to the backend with a run submission.
///
/// The wire shape carries only the role and text; thoughts and display
/// preferences stay client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who authored the turn.
    pub role: Role,
    /// The text body.
    pub content: String,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}
