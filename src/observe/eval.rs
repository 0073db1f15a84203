//! Evaluators — compare recorded pipeline outcomes against ground truth.
//!
//! Reports are pure reads recomputed from raw samples; `reset` is the only
//! mutator. With no samples every rate is defined as 0.0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::pipeline::types::ActionStatus;

// ── Summarizer evaluator ────────────────────────────────────────────

/// A recorded summarizer prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub email_id: String,
    pub summary: String,
    pub action: String,
    pub confidence: f32,
}

/// A ground-truth action label for an email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruth {
    pub email_id: String,
    pub true_action: String,
}

/// Accuracy metrics for the summarizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub total_predictions: usize,
    pub correct_predictions: usize,
    pub accuracy: f64,
    pub avg_confidence: f64,
}

/// Summarizer evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerReport {
    pub timestamp: DateTime<Utc>,
    pub metrics: EvalMetrics,
    pub total_samples: usize,
}

#[derive(Default)]
struct SummarizerSamples {
    predictions: Vec<Prediction>,
    ground_truth: Vec<GroundTruth>,
}

/// Evaluates summarizer action predictions against ground-truth labels.
///
/// The accuracy denominator is the TOTAL prediction count, not the matched
/// count: a prediction without a ground-truth label counts against accuracy.
/// Average confidence uses the same denominator, summing confidence only
/// over matched predictions.
#[derive(Default)]
pub struct SummarizerEvaluator {
    samples: RwLock<SummarizerSamples>,
}

impl SummarizerEvaluator {
    /// Create an empty evaluator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction.
    pub async fn add_prediction(
        &self,
        email_id: impl Into<String>,
        summary: impl Into<String>,
        action: impl Into<String>,
        confidence: f32,
    ) {
        self.samples.write().await.predictions.push(Prediction {
            email_id: email_id.into(),
            summary: summary.into(),
            action: action.into(),
            confidence,
        });
    }

    /// Record one ground-truth label.
    pub async fn add_ground_truth(
        &self,
        email_id: impl Into<String>,
        true_action: impl Into<String>,
    ) {
        self.samples.write().await.ground_truth.push(GroundTruth {
            email_id: email_id.into(),
            true_action: true_action.into(),
        });
    }

    /// Recompute accuracy metrics from the raw samples.
    pub async fn evaluate_actions(&self) -> EvalMetrics {
        let samples = self.samples.read().await;

        let truth_map: std::collections::HashMap<&str, &str> = samples
            .ground_truth
            .iter()
            .map(|gt| (gt.email_id.as_str(), gt.true_action.as_str()))
            .collect();

        let total = samples.predictions.len();
        let mut correct = 0usize;
        let mut total_confidence = 0.0f64;

        for pred in &samples.predictions {
            if let Some(true_action) = truth_map.get(pred.email_id.as_str()) {
                if pred.action.eq_ignore_ascii_case(true_action) {
                    correct += 1;
                }
                total_confidence += pred.confidence as f64;
            }
        }

        let metrics = EvalMetrics {
            total_predictions: total,
            correct_predictions: correct,
            accuracy: if total > 0 {
                correct as f64 / total as f64
            } else {
                0.0
            },
            avg_confidence: if total > 0 {
                total_confidence / total as f64
            } else {
                0.0
            },
        };

        info!(
            accuracy = metrics.accuracy,
            avg_confidence = metrics.avg_confidence,
            "Summarizer evaluation"
        );
        metrics
    }

    /// Build a report. Pure read.
    pub async fn export_report(&self) -> SummarizerReport {
        let metrics = self.evaluate_actions().await;
        let total_samples = self.samples.read().await.ground_truth.len();
        SummarizerReport {
            timestamp: Utc::now(),
            metrics,
            total_samples,
        }
    }

    /// Clear all samples.
    pub async fn reset(&self) {
        let mut samples = self.samples.write().await;
        samples.predictions.clear();
        samples.ground_truth.clear();
    }
}

// ── Action evaluator ────────────────────────────────────────────────

/// A recorded action outcome, with an optional human verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedAction {
    pub email_id: String,
    pub action: String,
    pub status: ActionStatus,
    /// `Some(true)` approved, `Some(false)` rejected, `None` still pending.
    pub human_approved: Option<bool>,
    pub timestamp: DateTime<Utc>,
}

/// Success-rate breakdown of executed actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionSuccessMetrics {
    pub total_actions: usize,
    pub successful: usize,
    pub pending_approval: usize,
    pub failed: usize,
    pub success_rate: f64,
}

/// Human approval breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalMetrics {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    pub approval_rate: f64,
}

/// Action evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    pub timestamp: DateTime<Utc>,
    pub success_metrics: ActionSuccessMetrics,
    pub approval_metrics: ApprovalMetrics,
}

/// Evaluates action agent outcomes and human approval decisions.
#[derive(Default)]
pub struct ActionEvaluator {
    results: RwLock<Vec<RecordedAction>>,
}

impl ActionEvaluator {
    /// Create an empty evaluator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one action outcome.
    pub async fn add_result(
        &self,
        email_id: impl Into<String>,
        action: impl Into<String>,
        status: ActionStatus,
        human_approved: Option<bool>,
    ) {
        self.results.write().await.push(RecordedAction {
            email_id: email_id.into(),
            action: action.into(),
            status,
            human_approved,
            timestamp: Utc::now(),
        });
    }

    /// Recompute the success-rate breakdown.
    pub async fn evaluate_success_rate(&self) -> ActionSuccessMetrics {
        let results = self.results.read().await;
        let total = results.len();
        let successful = results
            .iter()
            .filter(|r| r.status == ActionStatus::Success)
            .count();
        let pending_approval = results
            .iter()
            .filter(|r| r.status == ActionStatus::PendingApproval)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == ActionStatus::Failed)
            .count();

        ActionSuccessMetrics {
            total_actions: total,
            successful,
            pending_approval,
            failed,
            success_rate: if total > 0 {
                successful as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Recompute the human-approval breakdown. An absent verdict counts as
    /// pending.
    pub async fn evaluate_human_approval_rate(&self) -> ApprovalMetrics {
        let results = self.results.read().await;
        let total = results.len();
        let approved = results
            .iter()
            .filter(|r| r.human_approved == Some(true))
            .count();
        let rejected = results
            .iter()
            .filter(|r| r.human_approved == Some(false))
            .count();
        let pending = results.iter().filter(|r| r.human_approved.is_none()).count();

        ApprovalMetrics {
            total,
            approved,
            rejected,
            pending,
            approval_rate: if total > 0 {
                approved as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Build a report. Pure read.
    pub async fn export_report(&self) -> ActionReport {
        ActionReport {
            timestamp: Utc::now(),
            success_metrics: self.evaluate_success_rate().await,
            approval_metrics: self.evaluate_human_approval_rate().await,
        }
    }

    /// Clear all samples.
    pub async fn reset(&self) {
        self.results.write().await.clear();
    }
}

// ── Overall evaluator ───────────────────────────────────────────────

/// Action agent portion of the overall report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPerformance {
    pub success_metrics: ActionSuccessMetrics,
    pub approval_metrics: ApprovalMetrics,
}

/// Combined report over both evaluators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallReport {
    pub timestamp: DateTime<Utc>,
    pub elapsed_time_seconds: f64,
    pub summarizer_performance: EvalMetrics,
    pub action_performance: ActionPerformance,
}

/// Combines the summarizer and action evaluators.
pub struct OverallEvaluator {
    pub summarizer: SummarizerEvaluator,
    pub action: ActionEvaluator,
    started_at: RwLock<DateTime<Utc>>,
}

impl Default for OverallEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl OverallEvaluator {
    /// Create a fresh overall evaluator; the elapsed-time clock starts now.
    pub fn new() -> Self {
        Self {
            summarizer: SummarizerEvaluator::new(),
            action: ActionEvaluator::new(),
            started_at: RwLock::new(Utc::now()),
        }
    }

    /// Build the combined report. Pure read.
    pub async fn generate_report(&self) -> OverallReport {
        let now = Utc::now();
        let started_at = *self.started_at.read().await;
        let elapsed = now.signed_duration_since(started_at);

        OverallReport {
            timestamp: now,
            elapsed_time_seconds: elapsed.num_milliseconds() as f64 / 1000.0,
            summarizer_performance: self.summarizer.evaluate_actions().await,
            action_performance: ActionPerformance {
                success_metrics: self.action.evaluate_success_rate().await,
                approval_metrics: self.action.evaluate_human_approval_rate().await,
            },
        }
    }

    /// Reset both evaluators and restart the elapsed-time clock.
    pub async fn reset(&self) {
        self.summarizer.reset().await;
        self.action.reset().await;
        *self.started_at.write().await = Utc::now();
    }
}
