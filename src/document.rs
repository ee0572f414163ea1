//! The document collaborator seam.
//!
//! The core never touches the host document directly. Everything it needs —
//! reading content, applying an edit plan, backup and restore — goes through
//! [`DocumentAccess`], implemented by the embedding application. All four
//! operations are asynchronous, single-call, and may fail.

use serde_json::Value;

use crate::Result;
use crate::types::{ApplyOutcome, DocumentContent};

/// Access to the host document.
#[async_trait::async_trait]
pub trait DocumentAccess: Send + Sync {
    /// Reads the current document content.
    async fn document_content(&self) -> Result<DocumentContent>;

    /// Applies a transformation plan produced by the backend.
    async fn apply_transformation(&self, plan: &Value) -> Result<ApplyOutcome>;

    /// Creates a backup of the current document, returning its key.
    async fn create_backup(&self) -> Result<String>;

    /// Restores the document from a previously created backup.
    async fn restore_from_backup(&self, backup_key: &str) -> Result<()>;
}
