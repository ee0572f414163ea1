//! Per-run transient state and result consolidation.
//!
//! While a run streams, its observable state lives in a [`RunView`]: the
//! append-only thoughts log, the single-slot analysis accumulator, and the
//! single-slot staged final response. All three belong to exactly one
//! submission and are discarded together when the run reaches a terminal
//! state. On completion the view collapses into a [`CompletedRun`], the one
//! consolidated result handed back to the caller.

use serde_json::Value;

use crate::classify::Projection;
use crate::types::ChatMessage;

/// Which of the three transient views a progress chunk updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// A new line appended to the thoughts log.
    Thought,
    /// The analysis accumulator was overwritten.
    Analysis,
    /// Text was staged in the final-response slot.
    Response,
}

/// One progress notification, emitted per classified event.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressChunk {
    /// The wire event type that produced this chunk.
    pub event_type: String,
    /// Display text for the chunk.
    pub text: String,
    /// Which view the chunk updated.
    pub kind: ChunkKind,
}

/// The consolidated result of one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRun {
    /// Backend-assigned identifier of the (final) run attempt.
    pub run_id: String,
    /// Session id to carry on subsequent requests.
    pub session_id: Option<String>,
    /// Final response body.
    pub response: String,
    /// Every thought captured across all attempts of the submission.
    pub thoughts: Vec<String>,
    /// Last analysis text, when the run streamed one.
    pub analysis: Option<String>,
    /// Structured result payload (e.g. drafted claims).
    pub data: Option<Value>,
    /// Display preference for the thoughts panel.
    pub thoughts_expanded: bool,
    /// Number of retries it took to finish.
    pub retry_count: u32,
}

impl CompletedRun {
    /// Builds the finalized assistant message for the conversation history.
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::assistant(self.response)
            .with_thoughts(self.thoughts)
            .with_thoughts_expanded(self.thoughts_expanded)
    }
}

/// A terminal failure after retry exhaustion.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFailure {
    /// Backend-assigned identifier of the last attempt, when one was made.
    pub run_id: Option<String>,
    /// How many attempts were made in total.
    pub attempts: u32,
    /// What went wrong, rendered from the last error.
    pub message: String,
}

impl RunFailure {
    /// Builds the user-visible assistant message for this failure.
    pub fn into_message(&self) -> ChatMessage {
        ChatMessage::assistant(format!(
            "Sorry, something went wrong: {}. The request failed after {} attempt{}. \
             Please try sending your message again.",
            self.message,
            self.attempts,
            if self.attempts == 1 { "" } else { "s" },
        ))
    }
}

/// One update on a run's stream.
///
/// A well-formed run yields zero or more `Progress` items followed by exactly
/// one `Complete` or `Failed`. A cancelled run ends without a terminal item;
/// cancellation is never reported as completion or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum RunUpdate {
    /// One classified event was applied to the transient view.
    Progress(ProgressChunk),
    /// The run finished; the consolidated result is attached.
    Complete(CompletedRun),
    /// The run failed after exhausting its retries.
    Failed(RunFailure),
}

/// Effect of applying one projection to the view.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Applied {
    /// The view changed; notify the caller.
    Progress(ProgressChunk),
    /// The run is complete; finalize the view.
    Complete {
        /// Progress to emit before finalizing (e.g. a low-confidence marker).
        chunk: Option<ProgressChunk>,
    },
    /// The pipeline raised an error; the retry policy decides what happens.
    Fault {
        /// Error detail for the retry policy.
        detail: String,
        /// The thought-log marker to emit.
        chunk: ProgressChunk,
    },
    /// No observable change.
    Nothing,
}

/// The transient stream view owned by one submission.
#[derive(Debug, Default)]
pub(crate) struct RunView {
    thoughts: Vec<String>,
    analysis: Option<String>,
    staged_final: Option<String>,
    data: Option<Value>,
}

impl RunView {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Applies one classified event.
    pub(crate) fn apply(&mut self, event_type: &str, projection: Projection) -> Applied {
        match projection {
            Projection::Thought(text) => {
                // New reasoning supersedes any staged answer: never show a
                // stale final response next to fresher thoughts.
                self.staged_final = None;
                self.thoughts.push(text.clone());
                Applied::Progress(ProgressChunk {
                    event_type: event_type.to_string(),
                    text,
                    kind: ChunkKind::Thought,
                })
            }
            Projection::Analysis(text) => {
                self.analysis = Some(text.clone());
                Applied::Progress(ProgressChunk {
                    event_type: event_type.to_string(),
                    text,
                    kind: ChunkKind::Analysis,
                })
            }
            Projection::StageFinal(text) => {
                self.staged_final = Some(text.clone());
                Applied::Progress(ProgressChunk {
                    event_type: event_type.to_string(),
                    text,
                    kind: ChunkKind::Response,
                })
            }
            Projection::Complete { text, data } => {
                if let Some(text) = text {
                    self.staged_final = Some(text);
                }
                if let Some(data) = data {
                    self.data = Some(data);
                }
                Applied::Complete { chunk: None }
            }
            Projection::Fault(detail) => {
                self.staged_final = None;
                let marker = format!("⚠ {detail}");
                self.thoughts.push(marker.clone());
                Applied::Fault {
                    detail,
                    chunk: ProgressChunk {
                        event_type: event_type.to_string(),
                        text: marker,
                        kind: ChunkKind::Thought,
                    },
                }
            }
            Projection::LowConfidence(note) => {
                let marker = format!("⚠ {note}");
                self.thoughts.push(marker.clone());
                Applied::Complete {
                    chunk: Some(ProgressChunk {
                        event_type: event_type.to_string(),
                        text: marker,
                        kind: ChunkKind::Thought,
                    }),
                }
            }
            Projection::Ignore => Applied::Nothing,
        }
    }

    /// Records a retry marker thought.
    pub(crate) fn note_retry(&mut self, attempt: u32, max_retries: u32) -> ProgressChunk {
        let text = format!("Retrying ({attempt}/{max_retries})...");
        self.thoughts.push(text.clone());
        ProgressChunk {
            event_type: "retry".to_string(),
            text,
            kind: ChunkKind::Thought,
        }
    }

    /// Collapses the view into the consolidated run result.
    ///
    /// The response body falls back from the staged final response to
    /// structured claims, to the last analysis text, to a generic placeholder;
    /// a finished stream never leaves the caller without a message.
    pub(crate) fn finalize(
        self,
        run_id: String,
        session_id: Option<String>,
        thoughts_expanded: Option<bool>,
        retry_count: u32,
    ) -> CompletedRun {
        let response = self
            .staged_final
            .or_else(|| self.data.as_ref().and_then(claims_text))
            .or_else(|| self.analysis.clone())
            .unwrap_or_else(|| "Completed.".to_string());
        CompletedRun {
            run_id,
            session_id,
            response,
            thoughts: self.thoughts,
            analysis: self.analysis,
            data: self.data,
            thoughts_expanded: thoughts_expanded.unwrap_or(true),
            retry_count,
        }
    }
}

/// Renders a `data.claims` array into display text, when present.
fn claims_text(data: &Value) -> Option<String> {
    let claims = data.get("claims")?.as_array()?;
    let texts: Vec<&str> = claims.iter().filter_map(Value::as_str).collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n\n"))
    }
}
