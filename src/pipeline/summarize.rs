//! Summarize agent — one oracle call per email, with a fail-safe parse.
//!
//! The oracle's reply is ideally a JSON object, but nothing guarantees it.
//! Parsing is a fallible structured step returning [`SummaryParse`]; the
//! fallback policy routes every ambiguous outcome to `escalate` so an
//! unparseable reply can never trigger an autonomous side effect.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::pipeline::types::{FetchedEmail, SuggestedAction, SummaryOracle, SummaryResult};

/// Confidence assigned when the oracle reply could not be parsed.
const UNPARSED_CONFIDENCE: f32 = 0.5;

/// Summary text used when the oracle call itself failed.
const FAILED_SUMMARY: &str = "(summarization failed)";

/// Outcome of parsing an oracle reply.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryParse {
    /// The reply was a JSON object; missing fields took defaults.
    Parsed {
        summary: String,
        action: SuggestedAction,
        confidence: f32,
    },
    /// The reply was not a JSON object; the raw text is kept verbatim.
    Unparsed { raw: String },
}

/// Agent responsible for the summarize stage.
pub struct SummarizerAgent {
    oracle: Arc<dyn SummaryOracle>,
}

impl SummarizerAgent {
    /// Create a new summarize agent over an oracle.
    pub fn new(oracle: Arc<dyn SummaryOracle>) -> Self {
        Self { oracle }
    }

    /// Summarize one email and suggest an action.
    ///
    /// Never fails: an oracle error yields a zero-confidence `escalate`
    /// result and an unparseable reply yields the raw text at confidence
    /// 0.5, also `escalate`.
    pub async fn summarize_and_suggest(&self, email: &FetchedEmail) -> SummaryResult {
        info!(email_id = %email.id, "Summarizing email");

        let raw = match self.oracle.summarize(email).await {
            Ok(text) => text,
            Err(e) => {
                warn!(email_id = %email.id, error = %e, "Oracle call failed");
                return SummaryResult {
                    email_id: email.id.clone(),
                    summary: FAILED_SUMMARY.to_string(),
                    suggested_action: SuggestedAction::Escalate,
                    confidence: 0.0,
                    timestamp: Utc::now(),
                };
            }
        };

        let (summary, suggested_action, confidence) = match parse_summary_response(&raw) {
            SummaryParse::Parsed {
                summary,
                action,
                confidence,
            } => (summary, action, confidence),
            SummaryParse::Unparsed { raw } => {
                warn!(email_id = %email.id, "Oracle reply was not JSON, escalating");
                (raw, SuggestedAction::Escalate, UNPARSED_CONFIDENCE)
            }
        };

        info!(
            email_id = %email.id,
            action = suggested_action.as_str(),
            confidence,
            "Summary complete"
        );

        SummaryResult {
            email_id: email.id.clone(),
            summary,
            suggested_action,
            confidence,
            timestamp: Utc::now(),
        }
    }
}

/// Parse an oracle reply into a structured summary.
///
/// Accepts a bare JSON object, one wrapped in markdown fences, or one
/// embedded in surrounding prose. Anything else is `Unparsed`.
pub fn parse_summary_response(raw: &str) -> SummaryParse {
    let candidate = extract_json_object(raw);

    let value: serde_json::Value = match serde_json::from_str(&candidate) {
        Ok(v) => v,
        Err(_) => {
            return SummaryParse::Unparsed {
                raw: raw.to_string(),
            };
        }
    };

    let Some(obj) = value.as_object() else {
        return SummaryParse::Unparsed {
            raw: raw.to_string(),
        };
    };

    let summary = obj
        .get("summary")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string());
    let action = obj
        .get("action")
        .and_then(|v| v.as_str())
        .map(SuggestedAction::parse)
        .unwrap_or(SuggestedAction::Escalate);
    let confidence = obj
        .get("confidence")
        .and_then(|v| v.as_f64())
        .unwrap_or(UNPARSED_CONFIDENCE as f64) as f32;

    SummaryParse::Parsed {
        summary,
        action,
        confidence: confidence.clamp(0.0, 1.0),
    }
}

/// Extract a JSON object from oracle output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in a markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
