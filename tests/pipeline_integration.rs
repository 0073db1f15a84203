//! End-to-end pipeline tests over mock collaborators, plus the
//! observability sinks a caller records into.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use inbox_pilot::error::{ChannelError, LlmError};
use inbox_pilot::observe::{MetricsCollector, OverallEvaluator, RequestTracer};
use inbox_pilot::pipeline::types::{
    ActionStatus, FetchedEmail, MailActions, MailSource, RawEmail, SuggestedAction, SummaryOracle,
};
use inbox_pilot::pipeline::InboxOrchestrator;
use inbox_pilot::store::{ConversationMessage, MemoryBank, SessionStore};

// ── Mock collaborators ──────────────────────────────────────────────

struct FixtureSource {
    emails: Vec<RawEmail>,
}

#[async_trait]
impl MailSource for FixtureSource {
    async fn list_unread(&self, max_results: usize) -> Result<Vec<RawEmail>, ChannelError> {
        Ok(self.emails.iter().take(max_results).cloned().collect())
    }
}

/// Oracle that reads the action to suggest out of the email subject, and
/// answers garbage for subjects it does not understand.
struct ScriptedOracle;

#[async_trait]
impl SummaryOracle for ScriptedOracle {
    async fn summarize(&self, email: &FetchedEmail) -> Result<String, LlmError> {
        match email.subject.as_str() {
            "reply" | "archive" | "escalate" => Ok(format!(
                r#"{{"summary": "summary of {}", "action": "{}", "confidence": 0.9}}"#,
                email.id, email.subject
            )),
            "garbled" => Ok("I could not classify this email, sorry!".to_string()),
            _ => Err(LlmError::RequestFailed {
                provider: "mock".into(),
                reason: "model unavailable".into(),
            }),
        }
    }
}

#[derive(Default)]
struct RecordingActions {
    archived: AtomicUsize,
}

#[async_trait]
impl MailActions for RecordingActions {
    async fn archive(&self, _email_id: &str) -> Result<(), ChannelError> {
        self.archived.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn email(id: &str, subject: &str) -> RawEmail {
    RawEmail {
        id: id.into(),
        subject: Some(subject.into()),
        from: Some("alice@example.com".into()),
        snippet: Some("body preview".into()),
    }
}

fn orchestrator(emails: Vec<RawEmail>) -> (InboxOrchestrator, Arc<RecordingActions>) {
    let actions = Arc::new(RecordingActions::default());
    let orch = InboxOrchestrator::new(
        Arc::new(FixtureSource { emails }),
        Arc::new(ScriptedOracle),
        actions.clone(),
    );
    (orch, actions)
}

// ── Pipeline properties ─────────────────────────────────────────────

#[tokio::test]
async fn batch_results_are_aligned_and_complete() {
    let (orch, _) = orchestrator(vec![
        email("a", "archive"),
        email("b", "reply"),
        email("c", "garbled"),
        email("d", "broken"),
    ]);

    let report = orch.process_batch(10, false).await;
    assert_eq!(report.total_emails, 4);
    assert_eq!(report.summaries.len(), 4);
    assert_eq!(report.actions.len(), 4);
    for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
        assert_eq!(report.summaries[i].email_id, *id);
        assert_eq!(report.actions[i].email_id, *id);
    }
}

#[tokio::test]
async fn approval_gate_forces_every_status_pending() {
    let (orch, actions) = orchestrator(vec![
        email("a", "archive"),
        email("b", "reply"),
        email("c", "escalate"),
        email("d", "garbled"),
    ]);

    let report = orch.process_batch(10, true).await;
    assert!(
        report
            .actions
            .iter()
            .all(|a| a.status == ActionStatus::PendingApproval)
    );
    assert_eq!(actions.archived.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unattended_pass_only_archives_archive() {
    let (orch, actions) = orchestrator(vec![
        email("a", "archive"),
        email("b", "reply"),
        email("c", "escalate"),
    ]);

    let report = orch.process_batch(10, false).await;

    // archive auto-executes
    assert_eq!(report.actions[0].status, ActionStatus::Success);
    // reply is never auto-sent
    assert_eq!(report.actions[1].status, ActionStatus::PendingApproval);
    // escalate resolves to human review
    assert_eq!(report.actions[2].status, ActionStatus::Success);

    assert_eq!(actions.archived.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn degraded_summaries_escalate_instead_of_acting() {
    let (orch, actions) = orchestrator(vec![email("a", "garbled"), email("b", "broken")]);

    let report = orch.process_batch(10, false).await;

    // Unparseable reply: raw text kept, confidence 0.5
    assert_eq!(
        report.summaries[0].suggested_action,
        SuggestedAction::Escalate
    );
    assert_eq!(
        report.summaries[0].summary,
        "I could not classify this email, sorry!"
    );
    assert!((report.summaries[0].confidence - 0.5).abs() < f32::EPSILON);

    // Oracle failure: explicit failure text, confidence 0.0
    assert_eq!(
        report.summaries[1].suggested_action,
        SuggestedAction::Escalate
    );
    assert_eq!(report.summaries[1].summary, "(summarization failed)");
    assert_eq!(report.summaries[1].confidence, 0.0);

    // Neither degraded path may trigger a side effect
    assert_eq!(actions.archived.load(Ordering::SeqCst), 0);
}

// ── Caller-side recording into the sinks ────────────────────────────

#[tokio::test]
async fn recording_a_pass_into_metrics_and_evaluators() {
    let (orch, _) = orchestrator(vec![
        email("a", "archive"),
        email("b", "archive"),
        email("c", "escalate"),
        email("d", "broken"),
    ]);
    let metrics = MetricsCollector::new();
    let evaluator = OverallEvaluator::new();

    let report = orch.process_batch(10, false).await;

    metrics.record_email_processed().await;
    for summary in &report.summaries {
        metrics.record_summary_generated().await;
        evaluator
            .summarizer
            .add_prediction(
                &summary.email_id,
                &summary.summary,
                summary.suggested_action.as_str(),
                summary.confidence,
            )
            .await;
    }
    for action in &report.actions {
        metrics.record_action_executed(action.status).await;
        evaluator
            .action
            .add_result(
                &action.email_id,
                action.action.as_str(),
                action.status,
                None,
            )
            .await;
    }

    let snap = metrics.snapshot().await;
    assert_eq!(snap.total_summaries_generated, 4);
    assert_eq!(snap.total_actions_executed, 4);
    // a, b archived + c escalated succeed; d (oracle failure) escalates and
    // also resolves as success
    assert_eq!(snap.success_count, 4);
    assert_eq!(snap.error_count, 0);

    evaluator.summarizer.add_ground_truth("a", "archive").await;
    evaluator.summarizer.add_ground_truth("b", "reply").await;
    let eval = evaluator.summarizer.evaluate_actions().await;
    // One correct out of four predictions; c and d have no ground truth
    assert_eq!(eval.total_predictions, 4);
    assert_eq!(eval.correct_predictions, 1);
    assert!((eval.accuracy - 0.25).abs() < 1e-9);

    let success = evaluator.action.evaluate_success_rate().await;
    assert!((success.success_rate - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn tracing_one_request_end_to_end() {
    let (orch, _) = orchestrator(vec![email("a", "archive")]);
    let tracer = RequestTracer::new();

    tracer.start_trace("req-1").await;
    tracer
        .add_span("req-1", "inbox_processing_start", json!({"max_emails": 5}))
        .await;
    let report = orch.process_batch(5, true).await;
    tracer
        .add_span(
            "req-1",
            "inbox_processing_complete",
            json!({"total_emails": report.total_emails}),
        )
        .await;

    let spans = tracer.end_trace("req-1").await;
    let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "start",
            "inbox_processing_start",
            "inbox_processing_complete",
            "end"
        ]
    );
}

// ── Stores under pipeline-style usage ───────────────────────────────

#[tokio::test]
async fn memory_and_sessions_track_a_conversation() {
    let memory = MemoryBank::new();
    let sessions = SessionStore::new();

    sessions.create_session("user-1").await;
    sessions
        .add_message("user-1", ConversationMessage::new("user", "triage my inbox"))
        .await;
    sessions
        .add_message(
            "user-1",
            ConversationMessage::new("assistant", "2 emails need replies"),
        )
        .await;

    memory
        .store("user-1:last_run", json!({"total_emails": 2}), Some(3600))
        .await;

    assert_eq!(sessions.get_conversation("user-1").await.len(), 2);
    assert_eq!(
        memory.retrieve("user-1:last_run").await,
        Some(json!({"total_emails": 2}))
    );

    sessions.delete_session("user-1").await;
    assert!(sessions.get_session("user-1").await.is_none());
    // Memory outlives the session
    assert!(memory.retrieve("user-1:last_run").await.is_some());
}

#[tokio::test]
async fn concurrent_store_operations_stay_consistent() {
    let memory = Arc::new(MemoryBank::new());

    let mut handles = Vec::new();
    for i in 0..16 {
        let memory = memory.clone();
        handles.push(tokio::spawn(async move {
            memory.store(format!("k{i}"), json!(i), None).await;
            memory.retrieve(&format!("k{i}")).await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }
    assert_eq!(memory.list_keys().await.len(), 16);
}
