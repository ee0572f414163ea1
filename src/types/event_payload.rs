use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The payload attached to one event on the run stream.
///
/// The backend flattens stage-specific fields at the root of every event, so
/// every field is optional; the classifier reads only what it needs for a
/// given event type and ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Free-form text chunk (streaming analysis, passthrough thoughts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Human-readable status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Final response body, on completion-bearing events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Pipeline sub-stage marker (e.g. "analysis").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Whether the sub-stage is actively streaming text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_streaming: Option<bool>,
    /// Number of the claim just produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_number: Option<u32>,
    /// Confidence reported by intent classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    /// The classified intent label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Number of patents found by a prior-art search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patents_found: Option<u64>,
    /// Number of claims drafted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_claims: Option<u32>,
    /// Reviewer comments; shape varies by pipeline version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_comments: Option<Value>,
    /// Structured result payload (e.g. drafted claims) on `complete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Drafted claim texts, on claim-bearing events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Vec<String>>,
    /// Error detail, on `error` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventPayload {
    /// The best human-readable line this payload offers, if any.
    ///
    /// Preference order mirrors what the backend populates most reliably:
    /// `message`, then `text`, then `response`.
    pub fn display_text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.text.as_deref())
            .or(self.response.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// The final-response body this payload offers, if any.
    ///
    /// Preference order favors the dedicated response field: `response`, then
    /// `text`, then `message`.
    pub fn response_text(&self) -> Option<&str> {
        self.response
            .as_deref()
            .or(self.text.as_deref())
            .or(self.message.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Whether the payload marks the given sub-stage as actively streaming.
    ///
    /// Stage comparison is case-insensitive.
    pub fn is_streaming_stage(&self, stage: &str) -> bool {
        self.is_streaming == Some(true)
            && self
                .stage
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(stage))
    }
}
