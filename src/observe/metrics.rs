//! Metrics collector — monotonic pipeline counters plus a running average.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::pipeline::types::ActionStatus;

/// Point-in-time view of all counters.
///
/// Field names are the export schema — changing them breaks downstream
/// dashboards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_emails_processed: u64,
    pub total_summaries_generated: u64,
    pub total_actions_executed: u64,
    pub avg_response_time_ms: f64,
    pub success_count: u64,
    pub error_count: u64,
    pub pending_approval_count: u64,
}

/// Collects pipeline metrics. Counters only go up; `reset` is the single
/// way back to zero.
#[derive(Default)]
pub struct MetricsCollector {
    inner: RwLock<MetricsSnapshot>,
}

impl MetricsCollector {
    /// Create a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed email batch request.
    pub async fn record_email_processed(&self) {
        self.inner.write().await.total_emails_processed += 1;
    }

    /// Record one generated summary.
    pub async fn record_summary_generated(&self) {
        self.inner.write().await.total_summaries_generated += 1;
    }

    /// Record one executed action, bucketed by status.
    pub async fn record_action_executed(&self, status: ActionStatus) {
        let mut m = self.inner.write().await;
        m.total_actions_executed += 1;
        match status {
            ActionStatus::Success => m.success_count += 1,
            ActionStatus::Failed => m.error_count += 1,
            ActionStatus::PendingApproval => m.pending_approval_count += 1,
        }
    }

    /// Fold one response-time sample into the running average.
    ///
    /// Standard online mean: `new_avg = (old_avg * (n - 1) + sample) / n`
    /// with `n` the already-incremented processed counter. A sample arriving
    /// before any email was processed is dropped.
    pub async fn record_response_time(&self, time_ms: f64) {
        let mut m = self.inner.write().await;
        let n = m.total_emails_processed;
        if n == 0 {
            return;
        }
        m.avg_response_time_ms = (m.avg_response_time_ms * (n - 1) as f64 + time_ms) / n as f64;
    }

    /// Copy of the current counters.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        self.inner.read().await.clone()
    }

    /// Zero every counter and the running average.
    pub async fn reset(&self) {
        *self.inner.write().await = MetricsSnapshot::default();
        info!("Metrics reset");
    }
}
