use serde::{Deserialize, Serialize};

/// A snapshot of the active document, sent to the backend with every run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    /// Full document text.
    pub text: String,
    /// Paragraph-level split of the document, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraphs: Option<Vec<String>>,
    /// The user's current selection, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
}

impl DocumentContent {
    /// Creates a document snapshot from plain text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            paragraphs: None,
            selection: None,
        }
    }

    /// Sets the paragraph split.
    pub fn with_paragraphs(mut self, paragraphs: Vec<String>) -> Self {
        self.paragraphs = Some(paragraphs);
        self
    }

    /// Sets the current selection.
    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }

    /// Returns true if the snapshot carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
