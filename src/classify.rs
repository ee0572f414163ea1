//! Event classification for run streams.
//!
//! Every decoded [`RawEvent`] maps onto exactly one [`Projection`]: a status
//! line for the thoughts log, an overwrite of the analysis accumulator, text
//! staged into the final-response slot, authoritative completion, a run-level
//! fault, or nothing at all. Unknown event types are never dropped; they
//! become thoughts prefixed with their raw type name.
//!
//! Event-type and stage matching is case-insensitive: the backend has shipped
//! both `Analysis` and `analysis` stage markers in the past.

use serde_json::{Value, json};

use crate::EventPayload;
use crate::sse::RawEvent;

/// The observable effect of one classified event.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Append a status line to the thoughts log.
    Thought(String),
    /// Overwrite the single-slot analysis accumulator with the latest chunk.
    Analysis(String),
    /// Stage text in the final-response slot without terminating the run.
    StageFinal(String),
    /// Authoritative completion; no further events for the run are processed.
    Complete {
        /// Final response body, when the event carried one.
        text: Option<String>,
        /// Structured result payload (e.g. drafted claims).
        data: Option<Value>,
    },
    /// A semantic error raised by the pipeline; subject to the retry policy.
    Fault(String),
    /// A valid but low-confidence result; terminal and successful.
    LowConfidence(String),
    /// No observable effect.
    Ignore,
}

/// Classifies one event into its observable effect.
pub fn classify(event: &RawEvent) -> Projection {
    let payload = &event.payload;
    let kind = event.event_type.trim().to_ascii_lowercase();

    match kind.as_str() {
        "complete" => Projection::Complete {
            text: payload.response_text().map(str::to_string),
            data: merged_data(payload),
        },

        "results" | "llm_response" | "workflow_complete" => match payload.response_text() {
            Some(text) => Projection::StageFinal(text.to_string()),
            None => Projection::Thought(display_or(payload, "Results received")),
        },

        // Completion-bearing only when a substantive report came with it.
        "prior_art_complete" => match report_text(payload) {
            Some(report) => Projection::StageFinal(report.to_string()),
            None => Projection::Thought(match payload.patents_found {
                Some(n) => format!("Prior art search complete: {n} patents found"),
                None => display_or(payload, "Prior art search complete"),
            }),
        },

        // Same rule for legacy claim completion events.
        "claims_complete" => {
            if let Some(claims) = payload.claims.as_ref().filter(|c| !c.is_empty()) {
                Projection::StageFinal(claims.join("\n\n"))
            } else if let Some(report) = report_text(payload) {
                Projection::StageFinal(report.to_string())
            } else {
                Projection::Thought(match payload.num_claims {
                    Some(n) => format!("Claims drafting complete: {n} claims"),
                    None => display_or(payload, "Claims drafting complete"),
                })
            }
        }

        "claims_progress" => {
            if payload.is_streaming_stage("analysis") {
                match payload.text.as_deref().or(payload.message.as_deref()) {
                    Some(chunk) => Projection::Analysis(chunk.to_string()),
                    None => Projection::Ignore,
                }
            } else {
                Projection::Thought(display_or(payload, "Drafting claims..."))
            }
        }

        "intent_analysis" => Projection::Thought(display_or(payload, "Analyzing request intent...")),

        "intent_classified" => Projection::Thought(match (&payload.intent, payload.confidence_score) {
            (Some(intent), Some(score)) => format!("Intent: {intent} (confidence {score:.2})"),
            (Some(intent), None) => format!("Intent: {intent}"),
            _ => display_or(payload, "Intent classified"),
        }),

        "claims_drafting_start" => Projection::Thought(display_or(payload, "Drafting claims...")),

        "claim_generated" => Projection::Thought(match payload.claim_number {
            Some(n) => format!("Generated claim {n}"),
            None => display_or(payload, "Generated a claim"),
        }),

        "prior_art_start" => Projection::Thought(display_or(payload, "Searching prior art...")),

        "prior_art_progress" => Projection::Thought(match payload.patents_found {
            Some(n) => format!("Prior art search: {n} patents so far"),
            None => display_or(payload, "Searching prior art..."),
        }),

        "review_start" => Projection::Thought(display_or(payload, "Reviewing draft...")),

        "review_progress" => Projection::Thought(display_or(payload, "Reviewing draft...")),

        "review_complete" => Projection::Thought(match comment_count(payload) {
            Some(n) => format!("Review complete: {n} comments"),
            None => display_or(payload, "Review complete"),
        }),

        "processing" => Projection::Thought(display_or(payload, "Processing...")),

        // Raw passthrough of backend reasoning.
        "thoughts" => match payload.display_text() {
            Some(text) => Projection::Thought(text.to_string()),
            None => Projection::Ignore,
        },

        "error" => Projection::Fault(
            payload
                .error
                .as_deref()
                .or(payload.display_text())
                .unwrap_or("unknown error")
                .to_string(),
        ),

        "low_confidence" => Projection::LowConfidence(display_or(
            payload,
            "The assistant has low confidence in this result",
        )),

        // Unknown and legacy types still surface; nothing is silently dropped.
        _ => Projection::Thought(match payload.display_text() {
            Some(text) => format!("{}: {text}", event.event_type),
            None => event.event_type.clone(),
        }),
    }
}

/// Report body for legacy completion events: the dedicated response/text
/// fields only, never the short status `message`.
fn report_text(payload: &EventPayload) -> Option<&str> {
    payload
        .response
        .as_deref()
        .or(payload.text.as_deref())
        .filter(|s| !s.trim().is_empty())
}

fn display_or(payload: &EventPayload, fallback: &str) -> String {
    payload
        .display_text()
        .unwrap_or(fallback)
        .to_string()
}

fn comment_count(payload: &EventPayload) -> Option<usize> {
    match payload.review_comments.as_ref()? {
        Value::Array(comments) => Some(comments.len()),
        _ => None,
    }
}

fn merged_data(payload: &EventPayload) -> Option<Value> {
    payload.data.clone().or_else(|| {
        payload
            .claims
            .as_ref()
            .map(|claims| json!({ "claims": claims }))
    })
}
