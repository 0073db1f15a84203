//! Request tracer — per-request ordered span logs.
//!
//! Traces live for the life of the process; callers that run long are
//! responsible for periodic `clear`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Span name used for the trace start marker.
pub const START_SPAN: &str = "start";

/// Span name used for the trace end marker.
pub const END_SPAN: &str = "end";

/// One named, timestamped record within a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Span name.
    pub name: String,
    /// When the span was appended.
    pub timestamp: DateTime<Utc>,
    /// Free-form attributes.
    pub attributes: serde_json::Value,
}

impl Span {
    fn marker(name: &str) -> Self {
        Self {
            name: name.to_string(),
            timestamp: Utc::now(),
            attributes: serde_json::Value::Null,
        }
    }
}

/// Keeps one ordered span list per request identifier.
///
/// Insertion order is the only ordering guarantee — spans are never
/// reordered by timestamp.
#[derive(Default)]
pub struct RequestTracer {
    traces: RwLock<HashMap<String, Vec<Span>>>,
}

impl RequestTracer {
    /// Create an empty tracer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a trace with a fresh start marker.
    ///
    /// Restarting an existing trace discards its prior spans — last start
    /// wins.
    pub async fn start_trace(&self, trace_id: impl Into<String>) {
        let trace_id = trace_id.into();
        self.traces
            .write()
            .await
            .insert(trace_id, vec![Span::marker(START_SPAN)]);
    }

    /// Append one span. Auto-starts the trace if it does not exist yet.
    pub async fn add_span(
        &self,
        trace_id: &str,
        name: impl Into<String>,
        attributes: serde_json::Value,
    ) {
        let name = name.into();
        let mut traces = self.traces.write().await;
        let spans = traces
            .entry(trace_id.to_string())
            .or_insert_with(|| vec![Span::marker(START_SPAN)]);
        spans.push(Span {
            name: name.clone(),
            timestamp: Utc::now(),
            attributes,
        });
        info!(trace_id = %trace_id, span = %name, "Trace span added");
    }

    /// Append the end marker and return the full span list.
    ///
    /// Ending a never-started trace returns an empty list. The trace stays
    /// resident after ending, until `clear`.
    pub async fn end_trace(&self, trace_id: &str) -> Vec<Span> {
        let mut traces = self.traces.write().await;
        match traces.get_mut(trace_id) {
            Some(spans) => {
                spans.push(Span::marker(END_SPAN));
                spans.clone()
            }
            None => Vec::new(),
        }
    }

    /// Span list for a trace; empty when unknown.
    pub async fn get_trace(&self, trace_id: &str) -> Vec<Span> {
        self.traces
            .read()
            .await
            .get(trace_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop every trace.
    pub async fn clear(&self) {
        self.traces.write().await.clear();
        info!("Cleared all traces");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn full_trace_sequence_in_append_order() {
        let tracer = RequestTracer::new();
        tracer.start_trace("t1").await;
        tracer.add_span("t1", "a", json!({})).await;
        tracer.add_span("t1", "b", json!({"k": 1})).await;

        let spans = tracer.end_trace("t1").await;
        let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![START_SPAN, "a", "b", END_SPAN]);
    }

    #[tokio::test]
    async fn add_span_auto_starts_trace() {
        let tracer = RequestTracer::new();
        tracer.add_span("t1", "work", json!({})).await;

        let spans = tracer.get_trace("t1").await;
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, START_SPAN);
        assert_eq!(spans[1].name, "work");
    }

    #[tokio::test]
    async fn restart_discards_prior_spans() {
        let tracer = RequestTracer::new();
        tracer.start_trace("t1").await;
        tracer.add_span("t1", "old", json!({})).await;

        tracer.start_trace("t1").await;
        let spans = tracer.get_trace("t1").await;
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, START_SPAN);
    }

    #[tokio::test]
    async fn end_unknown_trace_returns_empty() {
        let tracer = RequestTracer::new();
        assert!(tracer.end_trace("ghost").await.is_empty());
    }

    #[tokio::test]
    async fn trace_persists_after_end() {
        let tracer = RequestTracer::new();
        tracer.start_trace("t1").await;
        tracer.end_trace("t1").await;

        let spans = tracer.get_trace("t1").await;
        assert_eq!(spans.len(), 2);
        assert_eq!(spans.last().unwrap().name, END_SPAN);
    }

    #[tokio::test]
    async fn get_unknown_trace_returns_empty() {
        let tracer = RequestTracer::new();
        assert!(tracer.get_trace("ghost").await.is_empty());
    }

    #[tokio::test]
    async fn span_attributes_preserved() {
        let tracer = RequestTracer::new();
        tracer
            .add_span("t1", "fetch", json!({"max_emails": 10}))
            .await;

        let spans = tracer.get_trace("t1").await;
        assert_eq!(spans[1].attributes, json!({"max_emails": 10}));
    }

    #[tokio::test]
    async fn clear_drops_all_traces() {
        let tracer = RequestTracer::new();
        tracer.start_trace("t1").await;
        tracer.start_trace("t2").await;
        tracer.clear().await;
        assert!(tracer.get_trace("t1").await.is_empty());
        assert!(tracer.get_trace("t2").await.is_empty());
    }
}
