//! The streaming session controller.
//!
//! [`SessionController`] owns the submit-a-message-and-stream-progress
//! operation: it starts a run, consumes its event stream, projects each event
//! into the transient view, and resolves to one consolidated result. It
//! enforces the at-most-one-run invariant, retries transport and pipeline
//! failures with a progressively growing delay, and distinguishes
//! cancellation from failure everywhere.
//!
//! Run identity is explicit: every submission gets a sequence number, and no
//! projection or update is applied unless the submission is still the
//! controller's active run. A superseded run's late events are discarded
//! rather than corrupting the newer run's state.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::client::Backend;
use crate::document::DocumentAccess;
use crate::error::{Error, Result};
use crate::observability::{
    RUN_CANCELLATIONS, RUN_COMPLETIONS, RUN_FAILURES, RUN_RETRIES, RUN_RETRY_BACKOFF,
    STREAM_ERRORS, STREAM_EVENTS, TRANSFORMS, TRANSFORM_ROLLBACKS,
};
use crate::run::{Applied, RunFailure, RunUpdate, RunView};
use crate::run_logger::RunLogger;
use crate::session::config::SessionConfig;
use crate::types::{
    ChatMessage, DocumentContent, HistoryEntry, RunState, StartRunRequest, TransformReport,
    TransformRequest,
};

/// Counters describing what a controller has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Runs that resolved with a consolidated message.
    pub runs_completed: u64,
    /// Runs that failed after exhausting retries.
    pub runs_failed: u64,
    /// Runs cancelled by the caller or superseded.
    pub runs_cancelled: u64,
    /// Retry attempts across all submissions.
    pub retries: u64,
    /// Stream events processed across all submissions.
    pub events_processed: u64,
}

/// Bookkeeping for the one run allowed to be active.
#[derive(Debug)]
struct ActiveRun {
    seq: u64,
    run_id: Option<String>,
    state: RunState,
    cancel: CancellationToken,
    thoughts_expanded: Option<bool>,
}

#[derive(Debug, Default)]
struct ControllerState {
    seq: AtomicU64,
    active: Mutex<Option<ActiveRun>>,
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
    runs_cancelled: AtomicU64,
    retries: AtomicU64,
    events_processed: AtomicU64,
}

impl ControllerState {
    fn is_active(&self, seq: u64) -> bool {
        self.active
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|a| a.seq == seq)
    }

    fn record_run_id(&self, seq: u64, run_id: &str) -> bool {
        let mut active = self.active.lock().unwrap();
        match active.as_mut() {
            Some(a) if a.seq == seq => {
                a.run_id = Some(run_id.to_string());
                a.state = RunState::Streaming;
                true
            }
            _ => false,
        }
    }

    fn thoughts_toggle(&self, seq: u64) -> Option<bool> {
        self.active
            .lock()
            .unwrap()
            .as_ref()
            .filter(|a| a.seq == seq)
            .and_then(|a| a.thoughts_expanded)
    }

    fn clear_active(&self, seq: u64) {
        let mut active = self.active.lock().unwrap();
        if active.as_ref().is_some_and(|a| a.seq == seq) {
            *active = None;
        }
    }
}

/// The stream of updates for one submission.
///
/// Yields zero or more [`RunUpdate::Progress`] items followed by exactly one
/// [`RunUpdate::Complete`] or [`RunUpdate::Failed`]. A cancelled submission's
/// stream ends without a terminal item.
#[derive(Debug)]
pub struct RunStream {
    rx: mpsc::UnboundedReceiver<RunUpdate>,
}

impl RunStream {
    /// Receives the next update, or `None` once the run is over.
    pub async fn next_update(&mut self) -> Option<RunUpdate> {
        self.rx.recv().await
    }
}

impl Stream for RunStream {
    type Item = RunUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// The streaming session controller.
///
/// Cheap to clone; clones share the same active-run slot, so the
/// at-most-one-run invariant holds across all of them.
#[derive(Clone)]
pub struct SessionController {
    backend: Backend,
    config: SessionConfig,
    logger: Option<Arc<dyn RunLogger>>,
    state: Arc<ControllerState>,
    transform_gate: Arc<tokio::sync::Mutex<()>>,
}

impl SessionController {
    /// Creates a controller from a backend client and configuration.
    pub fn new(backend: Backend, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            logger: None,
            state: Arc::new(ControllerState::default()),
            transform_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Attaches a run logger.
    pub fn with_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns true while a run is in flight.
    pub fn has_active_run(&self) -> bool {
        self.state.active.lock().unwrap().is_some()
    }

    /// The lifecycle state of the active run, or `None` when idle.
    ///
    /// Terminal states are never observed here; a run that completes, fails,
    /// or is cancelled stops being the active run in the same step.
    pub fn active_run_state(&self) -> Option<RunState> {
        self.state.active.lock().unwrap().as_ref().map(|a| a.state)
    }

    /// Counters for everything this controller has driven.
    pub fn stats(&self) -> ControllerStats {
        ControllerStats {
            runs_completed: self.state.runs_completed.load(Ordering::Relaxed),
            runs_failed: self.state.runs_failed.load(Ordering::Relaxed),
            runs_cancelled: self.state.runs_cancelled.load(Ordering::Relaxed),
            retries: self.state.retries.load(Ordering::Relaxed),
            events_processed: self.state.events_processed.load(Ordering::Relaxed),
        }
    }

    /// Records the user's thoughts-panel toggle for the active run.
    ///
    /// The last explicit choice made while streaming is preserved onto the
    /// finalized message; with no toggle the message defaults to expanded.
    pub fn set_thoughts_expanded(&self, expanded: bool) {
        if let Some(active) = self.state.active.lock().unwrap().as_mut() {
            active.thoughts_expanded = Some(expanded);
        }
    }

    /// Submits a user message and opens its update stream.
    ///
    /// `history` is a read-only snapshot and is never mutated; the controller
    /// truncates it to the configured history limit before sending. Any run
    /// already in flight is superseded: its transport is aborted and the
    /// backend is notified best-effort before the new run starts.
    pub fn submit(
        &self,
        message: &str,
        history: &[ChatMessage],
        document: DocumentContent,
        session_id: Option<String>,
    ) -> Result<RunStream> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::validation(
                "message must not be empty",
                Some("user_message".to_string()),
            ));
        }

        let seq = self.state.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let superseded = {
            let mut active = self.state.active.lock().unwrap();
            active.replace(ActiveRun {
                seq,
                run_id: None,
                state: RunState::Created,
                cancel: cancel.clone(),
                thoughts_expanded: None,
            })
        };
        if let Some(superseded) = superseded {
            debug!(seq = superseded.seq, "superseding active run");
            self.state.runs_cancelled.fetch_add(1, Ordering::Relaxed);
            RUN_CANCELLATIONS.click();
            superseded.cancel.cancel();
            if let Some(run_id) = superseded.run_id {
                self.notify_backend_cancel(run_id);
            }
        }

        let start = history.len().saturating_sub(
            self.config.history_limit.unwrap_or(history.len()),
        );
        let request = StartRunRequest {
            user_message: message.to_string(),
            conversation_history: history[start..].iter().map(HistoryEntry::from).collect(),
            document_content: document,
            session_id,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let driver = Driver {
            backend: self.backend.clone(),
            config: self.config.clone(),
            logger: self.logger.clone(),
            state: Arc::clone(&self.state),
            seq,
            cancel,
            tx,
        };
        tokio::spawn(driver.drive(request));

        Ok(RunStream { rx })
    }

    /// Cancels the active run, if any.
    ///
    /// Aborts the transport, notifies the backend best-effort, and clears
    /// transient state. The run's stream ends without a terminal update;
    /// cancellation is never reported as completion or failure.
    pub fn cancel(&self) {
        let active = self.state.active.lock().unwrap().take();
        if let Some(active) = active {
            self.state.runs_cancelled.fetch_add(1, Ordering::Relaxed);
            RUN_CANCELLATIONS.click();
            active.cancel.cancel();
            if let Some(run_id) = active.run_id {
                self.notify_backend_cancel(run_id);
            }
        }
    }

    /// Fire-and-forget backend notification that a run is cancelled.
    fn notify_backend_cancel(&self, run_id: String) {
        let backend = self.backend.clone();
        tokio::spawn(async move {
            if let Err(err) = backend.cancel_run(&run_id).await {
                warn!(%run_id, %err, "failed to notify backend of run cancellation");
            }
        });
    }

    /// Transforms the document via the backend-produced plan.
    ///
    /// Single-flight: a second call while one is in progress fails
    /// immediately. The sequence is backup → plan → apply; a failed apply
    /// restores the backup before the error is returned.
    pub async fn transform_document(
        &self,
        user_request: &str,
        document: &dyn DocumentAccess,
        session_id: Option<&str>,
    ) -> Result<TransformReport> {
        let user_request = user_request.trim();
        if user_request.is_empty() {
            return Err(Error::validation(
                "transformation request must not be empty",
                Some("user_request".to_string()),
            ));
        }
        let _gate = self.transform_gate.try_lock().map_err(|_| {
            Error::validation("a document transformation is already in flight", None)
        })?;
        TRANSFORMS.click();

        let document_content = document.document_content().await?;
        let backup_key = document.create_backup().await?;

        let response = self
            .backend
            .transform_document(&TransformRequest {
                user_request: user_request.to_string(),
                document_content,
                session_id: session_id.map(str::to_string),
            })
            .await?;
        if !response.success {
            let detail = response.error.unwrap_or(response.message);
            return Err(Error::unknown(format!("transformation rejected: {detail}")));
        }
        let plan = response.data.ok_or_else(|| {
            Error::serialization("transform response missing plan", None)
        })?;

        match document.apply_transformation(&plan.plan).await {
            Ok(outcome) if outcome.success => Ok(TransformReport {
                summary: plan.summary,
                changes_applied: outcome.changes_applied,
                backup_key,
            }),
            Ok(outcome) => {
                self.rollback(document, &backup_key).await;
                Err(Error::unknown(format!(
                    "failed to apply transformation: {}",
                    outcome.message
                )))
            }
            Err(err) => {
                self.rollback(document, &backup_key).await;
                Err(err)
            }
        }
    }

    async fn rollback(&self, document: &dyn DocumentAccess, backup_key: &str) {
        TRANSFORM_ROLLBACKS.click();
        if let Err(err) = document.restore_from_backup(backup_key).await {
            warn!(backup_key, %err, "failed to restore document backup");
        }
    }
}

/// Outcome of one connection attempt.
enum Attempt {
    /// The stream finished; finalize the view.
    Completed { run_id: String, session_id: String },
    /// The submission was cancelled or superseded; vanish silently.
    Cancelled,
    /// Something failed; the retry policy decides what happens next.
    Error(Error),
}

/// The task that drives one submission to a terminal state.
struct Driver {
    backend: Backend,
    config: SessionConfig,
    logger: Option<Arc<dyn RunLogger>>,
    state: Arc<ControllerState>,
    seq: u64,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<RunUpdate>,
}

impl Driver {
    async fn drive(self, request: StartRunRequest) {
        let mut view = RunView::new();
        let mut retries: u32 = 0;
        let mut last_run_id: Option<String> = None;

        loop {
            match self.attempt(&request, &mut view, &mut last_run_id, retries).await {
                Attempt::Completed { run_id, session_id } => {
                    let toggle = self.state.thoughts_toggle(self.seq);
                    let completed =
                        view.finalize(run_id, Some(session_id), toggle, retries);
                    if let Some(logger) = &self.logger {
                        logger.log_completed(&completed);
                    }
                    self.state.runs_completed.fetch_add(1, Ordering::Relaxed);
                    RUN_COMPLETIONS.click();
                    self.emit(RunUpdate::Complete(completed));
                    self.state.clear_active(self.seq);
                    return;
                }
                Attempt::Cancelled => {
                    // Transient state dies with this task; no terminal update.
                    self.state.clear_active(self.seq);
                    return;
                }
                Attempt::Error(err) => {
                    if err.is_retryable() && retries < self.config.max_retries {
                        retries += 1;
                        self.state.retries.fetch_add(1, Ordering::Relaxed);
                        RUN_RETRIES.click();
                        let chunk = view.note_retry(retries, self.config.max_retries);
                        if !self.emit(RunUpdate::Progress(chunk)) {
                            self.state.clear_active(self.seq);
                            return;
                        }
                        let delay = self.config.retry_delay(retries);
                        RUN_RETRY_BACKOFF.add(delay.as_secs_f64());
                        debug!(seq = self.seq, retries, ?delay, %err, "retrying run");
                        tokio::select! {
                            _ = self.cancel.cancelled() => {
                                self.state.clear_active(self.seq);
                                return;
                            }
                            _ = tokio::time::sleep(delay) => {}
                        }
                        continue;
                    }

                    let attempts = retries + 1;
                    let failure = RunFailure {
                        run_id: last_run_id,
                        attempts,
                        message: err.to_string(),
                    };
                    if let Some(logger) = &self.logger {
                        logger.log_failed(failure.run_id.as_deref(), attempts, &failure.message);
                    }
                    self.state.runs_failed.fetch_add(1, Ordering::Relaxed);
                    RUN_FAILURES.click();
                    self.emit(RunUpdate::Failed(failure));
                    self.state.clear_active(self.seq);
                    return;
                }
            }
        }
    }

    /// Runs one connect-and-stream attempt.
    async fn attempt(
        &self,
        request: &StartRunRequest,
        view: &mut RunView,
        last_run_id: &mut Option<String>,
        attempt: u32,
    ) -> Attempt {
        if self.cancel.is_cancelled() {
            return Attempt::Cancelled;
        }

        let started = tokio::select! {
            _ = self.cancel.cancelled() => return Attempt::Cancelled,
            started = self.backend.start_run(request) => started,
        };
        let started = match started {
            Ok(started) => started,
            Err(err) => return Attempt::Error(err),
        };
        if !self.state.record_run_id(self.seq, &started.run_id) {
            // Superseded between submit and connect.
            return Attempt::Cancelled;
        }
        *last_run_id = Some(started.run_id.clone());
        if let Some(logger) = &self.logger {
            logger.log_run_started(&started.run_id, attempt);
        }

        let events = tokio::select! {
            _ = self.cancel.cancelled() => return Attempt::Cancelled,
            events = self.backend.open_events(&started.run_id) => events,
        };
        let mut events = match events {
            Ok(events) => events,
            Err(err) => return Attempt::Error(err),
        };

        loop {
            let item = tokio::select! {
                _ = self.cancel.cancelled() => return Attempt::Cancelled,
                item = events.next() => item,
            };
            match item {
                // End of stream, sentinel or not: resolve with whatever was
                // staged. A stream never hangs the caller.
                None => {
                    return Attempt::Completed {
                        run_id: started.run_id,
                        session_id: started.session_id,
                    };
                }
                Some(Err(err)) => {
                    STREAM_ERRORS.click();
                    return Attempt::Error(err);
                }
                Some(Ok(event)) => {
                    STREAM_EVENTS.click();
                    self.state.events_processed.fetch_add(1, Ordering::Relaxed);
                    if !self.state.is_active(self.seq) {
                        // A newer run took over; discard and vanish.
                        return Attempt::Cancelled;
                    }
                    if let Some(logger) = &self.logger {
                        logger.log_event(&started.run_id, &event);
                    }
                    match view.apply(&event.event_type, classify(&event)) {
                        Applied::Progress(chunk) => {
                            if !self.emit(RunUpdate::Progress(chunk)) {
                                return Attempt::Cancelled;
                            }
                        }
                        Applied::Complete { chunk } => {
                            if let Some(chunk) = chunk
                                && !self.emit(RunUpdate::Progress(chunk))
                            {
                                return Attempt::Cancelled;
                            }
                            return Attempt::Completed {
                                run_id: started.run_id,
                                session_id: started.session_id,
                            };
                        }
                        Applied::Fault { detail, chunk } => {
                            let _ = self.emit(RunUpdate::Progress(chunk));
                            return Attempt::Error(Error::streaming(
                                format!("pipeline error: {detail}"),
                                None,
                            ));
                        }
                        Applied::Nothing => {}
                    }
                }
            }
        }
    }

    /// Sends an update if this submission is still the active run and the
    /// caller still listens. Returns false when the run should vanish.
    fn emit(&self, update: RunUpdate) -> bool {
        if !self.state.is_active(self.seq) {
            return false;
        }
        if self.tx.send(update).is_err() {
            // Caller dropped the stream: treat as cancellation, including the
            // best-effort backend notification.
            self.cancel.cancel();
            let run_id = self
                .state
                .active
                .lock()
                .unwrap()
                .as_ref()
                .filter(|a| a.seq == self.seq)
                .and_then(|a| a.run_id.clone());
            if let Some(run_id) = run_id {
                let backend = self.backend.clone();
                tokio::spawn(async move {
                    if let Err(err) = backend.cancel_run(&run_id).await {
                        warn!(%run_id, %err, "failed to notify backend of run cancellation");
                    }
                });
            }
            return false;
        }
        true
    }
}
