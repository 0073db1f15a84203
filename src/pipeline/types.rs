//! Shared types for the email processing pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChannelError, LlmError};

// ── Fetched email ───────────────────────────────────────────────────

/// Wire-level email record as returned by a mail source.
///
/// Fields the provider omits arrive as `None`; `FetchedEmail::from_raw`
/// fills the display defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEmail {
    /// Provider-native message ID.
    pub id: String,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Sender address or display string.
    #[serde(default)]
    pub from: Option<String>,
    /// Short preview of the body.
    #[serde(default)]
    pub snippet: Option<String>,
}

/// An email fetched by the fetch stage.
///
/// Immutable once created; consumed by the summarize stage. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedEmail {
    /// Unique ID within a batch.
    pub id: String,
    /// Subject line ("(no subject)" when absent).
    pub subject: String,
    /// Sender ("(unknown)" when absent).
    pub sender: String,
    /// Short preview text.
    pub snippet: String,
    /// Full body, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl FetchedEmail {
    /// Normalize a wire-level record into a pipeline email.
    pub fn from_raw(raw: RawEmail) -> Self {
        Self {
            id: raw.id,
            subject: raw.subject.unwrap_or_else(|| "(no subject)".to_string()),
            sender: raw.from.unwrap_or_else(|| "(unknown)".to_string()),
            snippet: raw.snippet.unwrap_or_default(),
            body: None,
        }
    }
}

// ── Suggested action ────────────────────────────────────────────────

/// Action the summarizer suggests for an email.
///
/// `Escalate` is the fail-safe: anything ambiguous or unparseable routes to
/// human review, never to an autonomous side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    Reply,
    Archive,
    Escalate,
}

impl SuggestedAction {
    /// Lower-case string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reply => "reply",
            Self::Archive => "archive",
            Self::Escalate => "escalate",
        }
    }

    /// Parse a free-text action label, case-insensitively.
    ///
    /// Unknown labels normalize to `Escalate`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "reply" => Self::Reply,
            "archive" => Self::Archive,
            _ => Self::Escalate,
        }
    }
}

// ── Summary result ──────────────────────────────────────────────────

/// Result of summarizing one email. Produced exactly once per `FetchedEmail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// ID of the email this summary belongs to.
    pub email_id: String,
    /// Summary text (raw oracle output when parsing fell back).
    pub summary: String,
    /// Suggested follow-up action.
    pub suggested_action: SuggestedAction,
    /// Confidence in [0.0, 1.0].
    pub confidence: f32,
    /// When the summary was produced.
    pub timestamp: DateTime<Utc>,
}

// ── Action result ───────────────────────────────────────────────────

/// Outcome status of the action stage for one email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Failed,
    PendingApproval,
}

impl ActionStatus {
    /// Snake-case string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::PendingApproval => "pending_approval",
        }
    }

    /// Parse a serialized status label.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "pending_approval" => Some(Self::PendingApproval),
            _ => None,
        }
    }
}

/// Result of the action stage for one email. Produced exactly once per
/// `SummaryResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// ID of the email the action applies to.
    pub email_id: String,
    /// The action that was resolved (normalized lower-case).
    pub action: SuggestedAction,
    /// Outcome status.
    pub status: ActionStatus,
    /// Human-readable outcome message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the action was resolved.
    pub timestamp: DateTime<Utc>,
}

// ── Pipeline report ─────────────────────────────────────────────────

/// Report for one pipeline pass.
///
/// `summaries` and `actions` have the same length as the fetched batch and
/// are positionally aligned to fetch order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Number of emails processed in this pass.
    pub total_emails: usize,
    /// One summary per fetched email, in fetch order.
    pub summaries: Vec<SummaryResult>,
    /// One action result per summary, in the same order.
    pub actions: Vec<ActionResult>,
    /// When the pass completed.
    pub timestamp: DateTime<Utc>,
}

impl PipelineReport {
    /// An empty pass (fetch returned nothing or failed).
    pub fn empty() -> Self {
        Self {
            total_emails: 0,
            summaries: Vec::new(),
            actions: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

// ── Collaborator traits ─────────────────────────────────────────────

/// Source of unread emails — pure I/O, no business logic.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Fetch up to `max_results` unread emails, newest-first as the
    /// provider orders them.
    async fn list_unread(&self, max_results: usize) -> Result<Vec<RawEmail>, ChannelError>;
}

/// Summarization oracle — typically an LLM.
///
/// Returns free text that is ideally a JSON object with `summary`, `action`
/// and `confidence` fields, but the pipeline tolerates anything (see
/// `summarize::parse_summary_response`).
#[async_trait]
pub trait SummaryOracle: Send + Sync {
    async fn summarize(&self, email: &FetchedEmail) -> Result<String, LlmError>;
}

/// Side-effect executor for resolved actions.
#[async_trait]
pub trait MailActions: Send + Sync {
    /// Archive a message. Called only for `archive` actions when approval is
    /// not required.
    async fn archive(&self, email_id: &str) -> Result<(), ChannelError>;
}
