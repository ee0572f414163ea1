// Public modules
pub mod document;
pub mod event_payload;
pub mod message;
pub mod run;
pub mod transform;

// Re-exports
pub use document::DocumentContent;
pub use event_payload::EventPayload;
pub use message::{ChatMessage, HistoryEntry, Role};
pub use run::{RunState, StartRunRequest, StartRunResponse};
pub use transform::{ApplyOutcome, TransformPlan, TransformReport, TransformRequest, TransformResponse};
