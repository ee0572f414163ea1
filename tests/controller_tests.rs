//! End-to-end tests for the streaming session controller against a scripted
//! backend.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inventio::{
    Backend, BackendConfig, ChatMessage, ChunkKind, Conversation, DocumentContent, RunState,
    RunUpdate, SessionConfig, SessionController,
};

fn controller_for(server: &MockServer, max_retries: u32) -> SessionController {
    let backend = Backend::new(BackendConfig::new().with_base_url(server.uri())).unwrap();
    let config = SessionConfig::new()
        .with_max_retries(max_retries)
        .with_retry_delays(Duration::from_millis(10), Duration::from_millis(50));
    SessionController::new(backend, config)
}

fn sse_body(records: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (event, data) in records {
        body.push_str(&format!("event: {event}\ndata: {data}\n\n"));
    }
    body
}

fn sse_body_with_sentinel(records: &[(&str, &str)]) -> String {
    let mut body = sse_body(records);
    body.push_str("data: {}\n\n");
    body
}

async fn mount_start(server: &MockServer, run_id: &str, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "run_id": run_id,
            "session_id": session_id,
        })))
        .mount(server)
        .await;
}

async fn mount_events(server: &MockServer, run_id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/runs/{run_id}/events")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

async fn collect_updates(stream: &mut inventio::RunStream) -> Vec<RunUpdate> {
    let mut updates = Vec::new();
    while let Some(update) = stream.next_update().await {
        updates.push(update);
    }
    updates
}

/// Scenario A: a full happy path with streamed analysis and drafted claims.
#[tokio::test]
async fn happy_path_consolidates_one_assistant_message() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    mount_events(
        &server,
        "run-1",
        sse_body_with_sentinel(&[
            ("intent_analysis", r#"{"message": "Analyzing request intent..."}"#),
            (
                "claims_progress",
                r#"{"stage": "analysis", "is_streaming": true, "text": "The invention covers"}"#,
            ),
            (
                "claims_progress",
                r#"{"stage": "analysis", "is_streaming": true, "text": "The invention covers AI-assisted handover."}"#,
            ),
            (
                "complete",
                r#"{"response": "Here are your claims.", "data": {"claims": ["Claim 1..."]}}"#,
            ),
        ]),
    )
    .await;

    let controller = controller_for(&server, 3);
    let mut conversation = Conversation::new();

    let mut stream = controller
        .submit(
            "5G handover using AI",
            conversation.history(None),
            DocumentContent::default(),
            conversation.session_id().map(str::to_string),
        )
        .unwrap();
    conversation.append_message(ChatMessage::user("5G handover using AI"));
    assert_eq!(conversation.message_count(), 1);

    let updates = collect_updates(&mut stream).await;

    // One thought, two analysis overwrites, one completion. Exactly one
    // terminal update, and it is the last one.
    assert_eq!(updates.len(), 4);
    match &updates[0] {
        RunUpdate::Progress(chunk) => {
            assert_eq!(chunk.kind, ChunkKind::Thought);
            assert_eq!(chunk.text, "Analyzing request intent...");
        }
        other => panic!("expected thought, got {other:?}"),
    }
    match &updates[2] {
        RunUpdate::Progress(chunk) => {
            assert_eq!(chunk.kind, ChunkKind::Analysis);
            assert_eq!(chunk.text, "The invention covers AI-assisted handover.");
        }
        other => panic!("expected analysis, got {other:?}"),
    }
    let run = match updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(run.response, "Here are your claims.");
    assert_eq!(run.session_id.as_deref(), Some("sess-1"));
    assert_eq!(
        run.data,
        Some(serde_json::json!({"claims": ["Claim 1..."]}))
    );
    assert!(run.thoughts_expanded);
    assert_eq!(run.retry_count, 0);
    assert_eq!(run.analysis.as_deref(), Some("The invention covers AI-assisted handover."));

    conversation.update_session_id(run.session_id.clone().unwrap());
    conversation.append_message(run.into_message());
    assert_eq!(conversation.message_count(), 2);
    assert_eq!(conversation.session_id(), Some("sess-1"));
    let assistant = &conversation.messages()[1];
    assert_eq!(assistant.content, "Here are your claims.");
    assert!(assistant.thoughts_expanded);
    assert_eq!(
        assistant.thoughts.as_deref(),
        Some(&["Analyzing request intent...".to_string()][..])
    );

    assert!(!controller.has_active_run());
    assert_eq!(controller.stats().runs_completed, 1);
}

/// Scenario B: a mid-stream toggle is preserved onto the finalized message.
#[tokio::test]
async fn mid_stream_toggle_overrides_default() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    mount_events(
        &server,
        "run-1",
        sse_body_with_sentinel(&[
            ("processing", r#"{"message": "working"}"#),
            ("complete", r#"{"response": "Done."}"#),
        ]),
    )
    .await;

    let controller = controller_for(&server, 3);
    let stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    // The active run exists as soon as submit returns; the toggle lands
    // before the driver can finalize.
    controller.set_thoughts_expanded(false);
    controller.set_thoughts_expanded(true);
    controller.set_thoughts_expanded(false);

    // RunStream is also a plain futures::Stream.
    use futures::StreamExt;
    let updates: Vec<RunUpdate> = stream.collect().await;
    let run = match updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert!(!run.thoughts_expanded);
    assert!(!run.into_message().thoughts_expanded);
}

/// Scenario C: two transport failures, then success; retry markers appear and
/// the error path never fires.
#[tokio::test]
async fn transport_failures_retry_then_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/runs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_start(&server, "run-1", "sess-1").await;
    mount_events(
        &server,
        "run-1",
        sse_body_with_sentinel(&[("complete", r#"{"response": "Recovered."}"#)]),
    )
    .await;

    let controller = controller_for(&server, 3);
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;

    let retry_markers: Vec<&str> = updates
        .iter()
        .filter_map(|u| match u {
            RunUpdate::Progress(chunk) if chunk.event_type == "retry" => {
                Some(chunk.text.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(retry_markers, vec!["Retrying (1/3)...", "Retrying (2/3)..."]);

    assert!(!updates.iter().any(|u| matches!(u, RunUpdate::Failed(_))));
    let run = match updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(run.response, "Recovered.");
    assert_eq!(run.retry_count, 2);
    assert_eq!(
        run.thoughts,
        vec!["Retrying (1/3)...", "Retrying (2/3)..."]
    );
    assert_eq!(controller.stats().retries, 2);
}

/// Scenario D: cancelling mid-stream fires neither terminal update and leaves
/// no active run behind.
#[tokio::test]
async fn cancel_mid_stream_is_silent() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    sse_body(&[("processing", r#"{"message": "working"}"#)]),
                    "text/event-stream",
                )
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/runs/run-1/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let controller = controller_for(&server, 3);
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    assert_eq!(controller.active_run_state(), Some(RunState::Created));

    // Let the run register with the backend, then cancel it.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(controller.active_run_state(), Some(RunState::Streaming));
    controller.cancel();
    assert_eq!(controller.active_run_state(), None);

    let updates = collect_updates(&mut stream).await;
    assert!(updates.is_empty(), "cancel produced updates: {updates:?}");
    assert!(!controller.has_active_run());
    assert_eq!(controller.stats().runs_cancelled, 1);
    assert_eq!(controller.stats().runs_completed, 0);
    assert_eq!(controller.stats().runs_failed, 0);
}

/// A malformed `data:` line between two valid events is skipped without
/// harming the consolidated result.
#[tokio::test]
async fn malformed_event_is_skipped() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    let body = format!(
        "{}event: claims_progress\ndata: {{this is not json\n\n{}",
        sse_body(&[("intent_analysis", r#"{"message": "Analyzing request intent..."}"#)]),
        sse_body_with_sentinel(&[(
            "complete",
            r#"{"response": "Survived.", "data": {"claims": ["Claim 1..."]}}"#
        )]),
    );
    mount_events(&server, "run-1", body).await;

    let controller = controller_for(&server, 0);
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;

    assert_eq!(updates.len(), 2);
    let run = match updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(run.response, "Survived.");
    assert_eq!(run.thoughts, vec!["Analyzing request intent..."]);
}

/// A new submission supersedes the active run; the superseded stream ends
/// with no terminal update.
#[tokio::test]
async fn new_submission_supersedes_active_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "run_id": "run-1",
            "session_id": "sess-1",
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    sse_body_with_sentinel(&[("complete", r#"{"response": "stale"}"#)]),
                    "text/event-stream",
                )
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/runs/run-1/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    mount_start(&server, "run-2", "sess-1").await;
    mount_events(
        &server,
        "run-2",
        sse_body_with_sentinel(&[("complete", r#"{"response": "fresh"}"#)]),
    )
    .await;

    let controller = controller_for(&server, 0);
    let mut first = controller
        .submit("first", &[], DocumentContent::default(), None)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut second = controller
        .submit("second", &[], DocumentContent::default(), None)
        .unwrap();

    let second_updates = collect_updates(&mut second).await;
    let run = match second_updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(run.response, "fresh");
    assert_eq!(run.run_id, "run-2");

    // The superseded run vanished without completing or failing.
    let first_updates = collect_updates(&mut first).await;
    assert!(
        !first_updates
            .iter()
            .any(|u| matches!(u, RunUpdate::Complete(_) | RunUpdate::Failed(_))),
        "superseded run produced a terminal update: {first_updates:?}"
    );
    assert_eq!(controller.stats().runs_cancelled, 1);
    assert_eq!(controller.stats().runs_completed, 1);
}

/// A stream that ends without sentinel or `complete` still resolves, using
/// the staged final response.
#[tokio::test]
async fn eof_without_sentinel_resolves_with_staged_response() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    mount_events(
        &server,
        "run-1",
        sse_body(&[("results", r#"{"response": "Staged report."}"#)]),
    )
    .await;

    let controller = controller_for(&server, 0);
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;
    let run = match updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(run.response, "Staged report.");
}

/// A stream that ends having staged nothing resolves with the placeholder.
#[tokio::test]
async fn eof_with_nothing_staged_resolves_with_placeholder() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    mount_events(
        &server,
        "run-1",
        sse_body(&[("processing", r#"{"message": "working"}"#)]),
    )
    .await;

    let controller = controller_for(&server, 0);
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;
    let run = match updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(run.response, "Completed.");
}

/// Retry exhaustion surfaces exactly one failure carrying the attempt count.
#[tokio::test]
async fn retry_exhaustion_fails_with_attempt_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/runs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let controller = controller_for(&server, 1);
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;

    let failure = match updates.last().unwrap() {
        RunUpdate::Failed(failure) => failure.clone(),
        other => panic!("expected failure, got {other:?}"),
    };
    assert_eq!(failure.attempts, 2);
    let message = failure.into_message();
    assert!(message.content.contains("failed after 2 attempts"));
    assert_eq!(
        updates
            .iter()
            .filter(|u| matches!(u, RunUpdate::Failed(_)))
            .count(),
        1
    );
    assert_eq!(controller.stats().runs_failed, 1);
}

/// A semantic `error` event takes the retry path and the run still recovers.
#[tokio::test]
async fn pipeline_error_event_triggers_retry() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    Mock::given(method("GET"))
        .and(path("/v1/runs/run-1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&[("error", r#"{"error": "search backend down"}"#)]),
            "text/event-stream",
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_events(
        &server,
        "run-1",
        sse_body_with_sentinel(&[("complete", r#"{"response": "Recovered."}"#)]),
    )
    .await;

    let controller = controller_for(&server, 3);
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;

    let texts: Vec<&str> = updates
        .iter()
        .filter_map(|u| match u {
            RunUpdate::Progress(chunk) => Some(chunk.text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["⚠ search backend down", "Retrying (1/3)..."]);

    let run = match updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(run.response, "Recovered.");
    assert_eq!(run.thoughts, vec!["⚠ search backend down", "Retrying (1/3)..."]);
}

/// `low_confidence` is terminal but successful: the completion path fires.
#[tokio::test]
async fn low_confidence_completes_instead_of_failing() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    mount_events(
        &server,
        "run-1",
        sse_body(&[
            ("results", r#"{"response": "Tentative report."}"#),
            ("low_confidence", r#"{"message": "Low confidence in this result"}"#),
        ]),
    )
    .await;

    let controller = controller_for(&server, 0);
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;

    assert!(!updates.iter().any(|u| matches!(u, RunUpdate::Failed(_))));
    let run = match updates.into_iter().next_back().unwrap() {
        RunUpdate::Complete(run) => run,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(run.response, "Tentative report.");
    assert_eq!(run.thoughts, vec!["⚠ Low confidence in this result"]);
}

/// The history limit truncates what goes over the wire, oldest dropped first.
#[tokio::test]
async fn history_is_truncated_to_configured_limit() {
    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    mount_events(
        &server,
        "run-1",
        sse_body_with_sentinel(&[("complete", r#"{"response": "ok"}"#)]),
    )
    .await;

    let backend = Backend::new(BackendConfig::new().with_base_url(server.uri())).unwrap();
    let config = SessionConfig::new()
        .with_max_retries(0)
        .with_history_limit(Some(2));
    let controller = SessionController::new(backend, config);

    let history = vec![
        ChatMessage::user("one"),
        ChatMessage::assistant("two"),
        ChatMessage::user("three"),
    ];
    let mut stream = controller
        .submit("draft claims", &history, DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;
    assert!(matches!(updates.last(), Some(RunUpdate::Complete(_))));

    let requests = server.received_requests().await.unwrap();
    let start = requests
        .iter()
        .find(|r| r.url.path() == "/v1/runs")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&start.body).unwrap();
    let sent: Vec<&str> = body["conversation_history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(sent, vec!["two", "three"]);
}

/// A run logger observes the attempt, the raw events, and the consolidation.
#[tokio::test]
async fn run_logger_observes_lifecycle() {
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl inventio::RunLogger for RecordingLogger {
        fn log_run_started(&self, run_id: &str, attempt: u32) {
            self.lines
                .lock()
                .unwrap()
                .push(format!("started {run_id} attempt {attempt}"));
        }

        fn log_event(&self, run_id: &str, event: &inventio::RawEvent) {
            self.lines
                .lock()
                .unwrap()
                .push(format!("event {run_id} {}", event.event_type));
        }

        fn log_completed(&self, run: &inventio::CompletedRun) {
            self.lines
                .lock()
                .unwrap()
                .push(format!("completed {}", run.run_id));
        }
    }

    let server = MockServer::start().await;
    mount_start(&server, "run-1", "sess-1").await;
    mount_events(
        &server,
        "run-1",
        sse_body_with_sentinel(&[
            ("processing", r#"{"message": "working"}"#),
            ("complete", r#"{"response": "Done."}"#),
        ]),
    )
    .await;

    let logger = std::sync::Arc::new(RecordingLogger::default());
    let controller = controller_for(&server, 0).with_logger(logger.clone());
    let mut stream = controller
        .submit("draft claims", &[], DocumentContent::default(), None)
        .unwrap();
    let updates = collect_updates(&mut stream).await;
    assert!(matches!(updates.last(), Some(RunUpdate::Complete(_))));

    let lines = logger.lines.lock().unwrap().clone();
    assert_eq!(
        lines,
        vec![
            "started run-1 attempt 0",
            "event run-1 processing",
            "event run-1 complete",
            "completed run-1",
        ]
    );
}

/// The document transform path: backup, plan, apply.
#[tokio::test]
async fn transform_applies_plan_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transform"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "planned",
            "data": {"plan": {"set_text": "amended body"}, "summary": "one replacement"},
        })))
        .mount(&server)
        .await;

    let controller = controller_for(&server, 0);
    let document = inventio_test_document::TestDocument::with_text("original body");
    let report = controller
        .transform_document("tighten claim 1", &document, Some("sess-1"))
        .await
        .unwrap();
    assert_eq!(report.summary.as_deref(), Some("one replacement"));
    assert_eq!(report.changes_applied, 1);
    assert_eq!(report.backup_key, "backup-1");
    assert_eq!(document.text(), "amended body");
}

/// A failed apply restores the backup before surfacing the error.
#[tokio::test]
async fn transform_rolls_back_on_apply_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transform"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "planned",
            "data": {"plan": {"set_text": "amended body"}},
        })))
        .mount(&server)
        .await;

    let controller = controller_for(&server, 0);
    let document = inventio_test_document::TestDocument::failing("original body");
    let err = controller
        .transform_document("tighten claim 1", &document, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to apply transformation"));
    assert_eq!(document.text(), "original body");
}

mod inventio_test_document {
    //! A minimal in-memory document collaborator for transform tests.

    use std::sync::Mutex;

    use inventio::types::{ApplyOutcome, DocumentContent};
    use inventio::{DocumentAccess, Error, Result};
    use serde_json::Value;

    pub struct TestDocument {
        text: Mutex<String>,
        backups: Mutex<Vec<String>>,
        fail_apply: bool,
    }

    impl TestDocument {
        pub fn with_text(text: &str) -> Self {
            Self {
                text: Mutex::new(text.to_string()),
                backups: Mutex::new(Vec::new()),
                fail_apply: false,
            }
        }

        pub fn failing(text: &str) -> Self {
            Self {
                fail_apply: true,
                ..Self::with_text(text)
            }
        }

        pub fn text(&self) -> String {
            self.text.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl DocumentAccess for TestDocument {
        async fn document_content(&self) -> Result<DocumentContent> {
            Ok(DocumentContent::from_text(self.text()))
        }

        async fn apply_transformation(&self, plan: &Value) -> Result<ApplyOutcome> {
            if self.fail_apply {
                return Ok(ApplyOutcome {
                    success: false,
                    message: "range not found".to_string(),
                    changes_applied: 0,
                    errors: Some(vec!["range not found".to_string()]),
                });
            }
            if let Some(replacement) = plan.get("set_text").and_then(Value::as_str) {
                *self.text.lock().unwrap() = replacement.to_string();
            }
            Ok(ApplyOutcome {
                success: true,
                message: "applied".to_string(),
                changes_applied: 1,
                errors: None,
            })
        }

        async fn create_backup(&self) -> Result<String> {
            let mut backups = self.backups.lock().unwrap();
            backups.push(self.text());
            Ok(format!("backup-{}", backups.len()))
        }

        async fn restore_from_backup(&self, backup_key: &str) -> Result<()> {
            let index: usize = backup_key
                .strip_prefix("backup-")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| Error::validation("unknown backup key", None))?;
            let backups = self.backups.lock().unwrap();
            let snapshot = backups
                .get(index - 1)
                .ok_or_else(|| Error::validation("unknown backup key", None))?;
            *self.text.lock().unwrap() = snapshot.clone();
            Ok(())
        }
    }
}
