//! Observability: metrics counters, request tracing and evaluation.

pub mod eval;
pub mod metrics;
pub mod tracer;

pub use eval::{ActionEvaluator, OverallEvaluator, SummarizerEvaluator};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use tracer::{RequestTracer, Span};
