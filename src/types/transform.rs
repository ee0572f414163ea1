use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::document::DocumentContent;

/// Request body for a document transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRequest {
    /// What the user asked to change.
    pub user_request: String,
    /// Snapshot of the document to transform.
    pub document_content: DocumentContent,
    /// Session to attribute the transformation to, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// The plan and summary produced by a successful transformation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformPlan {
    /// Opaque edit plan consumed by the document collaborator.
    pub plan: Value,
    /// Human-readable summary of the planned edits.
    #[serde(default)]
    pub summary: Option<String>,
}

/// Response to a transformation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformResponse {
    /// Whether the backend produced a plan.
    pub success: bool,
    /// Human-readable status.
    #[serde(default)]
    pub message: String,
    /// The plan, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TransformPlan>,
    /// Error detail, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of applying a transformation plan to the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Whether the edits were applied.
    pub success: bool,
    /// Human-readable status.
    #[serde(default)]
    pub message: String,
    /// Number of individual edits applied.
    #[serde(default)]
    pub changes_applied: u64,
    /// Per-edit failures, when any occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Result of a full transform operation: plan, application, and the backup
/// taken before any edit.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformReport {
    /// Summary of the planned edits, when the backend provided one.
    pub summary: Option<String>,
    /// Number of individual edits applied.
    pub changes_applied: u64,
    /// Key of the backup taken before applying, usable for manual restore.
    pub backup_key: String,
}
