//! Logging trait for run lifecycle observation.
//!
//! This module provides the [`RunLogger`] trait that allows callers to
//! capture the raw event traffic and outcomes of every run driven by a
//! [`SessionController`](crate::session::SessionController).

use crate::run::CompletedRun;
use crate::sse::RawEvent;

/// A trait for observing run lifecycle and event traffic.
///
/// Implement this trait to record every run the controller drives: when a run
/// starts (including retry attempts), each raw event as it is decoded, and
/// the consolidated result. Methods default to no-ops so implementations only
/// override what they care about.
///
/// # Example
///
/// ```rust,ignore
/// use inventio::{RunLogger, RawEvent};
/// use std::sync::Mutex;
///
/// struct EventTap {
///     events: Mutex<Vec<String>>,
/// }
///
/// impl RunLogger for EventTap {
///     fn log_event(&self, run_id: &str, event: &RawEvent) {
///         let mut events = self.events.lock().unwrap();
///         events.push(format!("{run_id}: {}", event.event_type));
///     }
/// }
/// ```
pub trait RunLogger: Send + Sync {
    /// Log the start of a run attempt.
    ///
    /// Called once per attempt; `attempt` is zero for the initial submission
    /// and counts up across retries of the same submission.
    fn log_run_started(&self, run_id: &str, attempt: u32) {
        let _ = (run_id, attempt);
    }

    /// Log an individual decoded stream event.
    fn log_event(&self, run_id: &str, event: &RawEvent) {
        let _ = (run_id, event);
    }

    /// Log the consolidated result of a completed run.
    fn log_completed(&self, run: &CompletedRun) {
        let _ = run;
    }

    /// Log a terminal failure after retry exhaustion.
    fn log_failed(&self, run_id: Option<&str>, attempts: u32, message: &str) {
        let _ = (run_id, attempts, message);
    }
}
