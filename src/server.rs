//! HTTP surface over the core: pipeline runs, sessions, memory, metrics,
//! evaluation and traces.
//!
//! Handlers contain no decision logic — they translate requests into core
//! operations and record outcomes into the observability sinks.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::observe::{MetricsCollector, OverallEvaluator, RequestTracer};
use crate::pipeline::types::ActionStatus;
use crate::pipeline::InboxOrchestrator;
use crate::store::{ConversationMessage, MemoryBank, SessionStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<InboxOrchestrator>,
    pub sessions: Arc<SessionStore>,
    pub memory: Arc<MemoryBank>,
    pub metrics: Arc<MetricsCollector>,
    pub tracer: Arc<RequestTracer>,
    pub evaluator: Arc<OverallEvaluator>,
}

/// Build the router over the shared state.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/process-inbox", get(process_inbox).post(process_inbox))
        .route("/sessions/{id}", get(get_session).post(post_session_message))
        .route(
            "/memory",
            get(get_memory).post(store_memory).delete(delete_memory),
        )
        .route("/metrics", get(get_metrics))
        .route("/evaluation", get(evaluation_overall))
        .route(
            "/evaluation/summarizer",
            get(summarizer_report).post(summarizer_record),
        )
        .route(
            "/evaluation/action",
            get(action_report).post(action_record),
        )
        .route("/traces/{id}", get(get_trace))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiResponse = (StatusCode, Json<Value>);

fn ok(body: Value) -> ApiResponse {
    (StatusCode::OK, Json(body))
}

fn not_found(message: &str) -> ApiResponse {
    (StatusCode::NOT_FOUND, Json(json!({"error": message})))
}

fn bad_request(message: &str) -> ApiResponse {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

// ── Index / health ──────────────────────────────────────────────────

async fn index() -> ApiResponse {
    ok(json!({
        "service": "inbox-pilot",
        "description": "Multi-agent system for email summarization and action suggestions",
        "endpoints": [
            "/process-inbox",
            "/sessions/{id}",
            "/memory",
            "/metrics",
            "/evaluation",
            "/traces/{id}",
            "/health",
        ],
    }))
}

async fn health() -> ApiResponse {
    ok(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}

// ── Pipeline ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ProcessQuery {
    max_emails: Option<usize>,
    require_approval: Option<bool>,
}

async fn process_inbox(
    State(state): State<AppState>,
    Query(query): Query<ProcessQuery>,
) -> ApiResponse {
    let trace_id = Uuid::new_v4().to_string();
    let max_emails = query.max_emails.unwrap_or(10);
    let require_approval = query.require_approval.unwrap_or(true);

    info!(trace_id = %trace_id, max_emails, require_approval, "Processing inbox");
    state.tracer.start_trace(&trace_id).await;
    state
        .tracer
        .add_span(
            &trace_id,
            "inbox_processing_start",
            json!({"max_emails": max_emails}),
        )
        .await;

    let started = std::time::Instant::now();
    let report = state
        .orchestrator
        .process_batch(max_emails, require_approval)
        .await;

    state.metrics.record_email_processed().await;
    state
        .metrics
        .record_response_time(started.elapsed().as_secs_f64() * 1000.0)
        .await;
    for _ in &report.summaries {
        state.metrics.record_summary_generated().await;
    }
    for action in &report.actions {
        state.metrics.record_action_executed(action.status).await;
    }

    state
        .tracer
        .add_span(
            &trace_id,
            "inbox_processing_complete",
            json!({
                "total_emails": report.total_emails,
                "timestamp": report.timestamp,
            }),
        )
        .await;
    state.tracer.end_trace(&trace_id).await;

    let mut body = serde_json::to_value(&report).unwrap_or_else(|_| json!({}));
    body["trace_id"] = json!(trace_id);
    ok(body)
}

// ── Sessions ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SessionMessageRequest {
    #[serde(default = "default_role")]
    role: String,
    #[serde(default)]
    content: String,
}

fn default_role() -> String {
    "user".to_string()
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    match state.sessions.get_session(&id).await {
        Some(session) => ok(serde_json::to_value(&session).unwrap_or_else(|_| json!({}))),
        None => not_found("session not found"),
    }
}

async fn post_session_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SessionMessageRequest>,
) -> ApiResponse {
    if state.sessions.get_session(&id).await.is_none() {
        state.sessions.create_session(&id).await;
    }
    state
        .sessions
        .add_message(&id, ConversationMessage::new(request.role, request.content))
        .await;
    ok(json!({"status": "message added"}))
}

// ── Memory ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StoreMemoryRequest {
    key: String,
    value: Value,
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

async fn store_memory(
    State(state): State<AppState>,
    Json(request): Json<StoreMemoryRequest>,
) -> ApiResponse {
    if request.key.is_empty() {
        return bad_request("missing key");
    }
    state
        .memory
        .store(request.key, request.value, request.ttl_seconds)
        .await;
    ok(json!({"status": "stored"}))
}

async fn get_memory(State(state): State<AppState>, Query(query): Query<KeyQuery>) -> ApiResponse {
    match query.key {
        Some(key) => match state.memory.retrieve(&key).await {
            Some(value) => ok(json!({"key": key, "value": value})),
            None => not_found("key not found"),
        },
        None => ok(json!({"keys": state.memory.list_keys().await})),
    }
}

async fn delete_memory(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> ApiResponse {
    match query.key {
        Some(key) => {
            state.memory.delete(&key).await;
            ok(json!({"status": "deleted"}))
        }
        None => bad_request("missing key"),
    }
}

// ── Metrics ─────────────────────────────────────────────────────────

async fn get_metrics(State(state): State<AppState>) -> ApiResponse {
    ok(serde_json::to_value(state.metrics.snapshot().await).unwrap_or_else(|_| json!({})))
}

// ── Evaluation ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum SummarizerSample {
    AddPrediction {
        email_id: String,
        #[serde(default)]
        summary: String,
        action: String,
        #[serde(default = "default_confidence")]
        confidence: f32,
    },
    AddTruth {
        email_id: String,
        true_action: String,
    },
}

fn default_confidence() -> f32 {
    0.5
}

async fn summarizer_record(
    State(state): State<AppState>,
    Json(sample): Json<SummarizerSample>,
) -> ApiResponse {
    match sample {
        SummarizerSample::AddPrediction {
            email_id,
            summary,
            action,
            confidence,
        } => {
            state
                .evaluator
                .summarizer
                .add_prediction(email_id, summary, action, confidence)
                .await;
        }
        SummarizerSample::AddTruth {
            email_id,
            true_action,
        } => {
            state
                .evaluator
                .summarizer
                .add_ground_truth(email_id, true_action)
                .await;
        }
    }
    ok(json!({"status": "recorded"}))
}

async fn summarizer_report(State(state): State<AppState>) -> ApiResponse {
    let report = state.evaluator.summarizer.export_report().await;
    ok(serde_json::to_value(&report).unwrap_or_else(|_| json!({})))
}

#[derive(Debug, Deserialize)]
struct ActionResultRequest {
    email_id: String,
    action: String,
    status: String,
    human_approved: Option<bool>,
}

async fn action_record(
    State(state): State<AppState>,
    Json(request): Json<ActionResultRequest>,
) -> ApiResponse {
    let Some(status) = ActionStatus::parse(&request.status) else {
        return bad_request("invalid status");
    };
    state
        .evaluator
        .action
        .add_result(
            request.email_id,
            request.action,
            status,
            request.human_approved,
        )
        .await;
    ok(json!({"status": "recorded"}))
}

async fn action_report(State(state): State<AppState>) -> ApiResponse {
    let report = state.evaluator.action.export_report().await;
    ok(serde_json::to_value(&report).unwrap_or_else(|_| json!({})))
}

async fn evaluation_overall(State(state): State<AppState>) -> ApiResponse {
    let report = state.evaluator.generate_report().await;
    ok(serde_json::to_value(&report).unwrap_or_else(|_| json!({})))
}

// ── Traces ──────────────────────────────────────────────────────────

async fn get_trace(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    let spans = state.tracer.get_trace(&id).await;
    if spans.is_empty() {
        return not_found("trace not found");
    }
    ok(json!({"trace_id": id, "spans": spans}))
}
