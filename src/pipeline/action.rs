//! Action agent — resolves suggested actions into outcomes.
//!
//! **Core invariant: only `archive` ever auto-executes.** Replies always
//! wait for a human to compose them, escalations always land in human
//! review, and the approval gate forces everything to `pending_approval`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::pipeline::types::{
    ActionResult, ActionStatus, MailActions, SuggestedAction, SummaryResult,
};

/// Agent responsible for the action stage.
pub struct ActionAgent {
    actions: Arc<dyn MailActions>,
}

impl ActionAgent {
    /// Create a new action agent over a side-effect executor.
    pub fn new(actions: Arc<dyn MailActions>) -> Self {
        Self { actions }
    }

    /// Resolve one summary into an action result.
    ///
    /// With `require_approval` set, every item yields `pending_approval`
    /// and no side effect is attempted.
    pub async fn execute_action(
        &self,
        summary: &SummaryResult,
        require_approval: bool,
    ) -> ActionResult {
        info!(
            email_id = %summary.email_id,
            action = summary.suggested_action.as_str(),
            require_approval,
            "Executing action"
        );

        if require_approval {
            return ActionResult {
                email_id: summary.email_id.clone(),
                action: summary.suggested_action,
                status: ActionStatus::PendingApproval,
                message: Some("Awaiting human approval".to_string()),
                timestamp: Utc::now(),
            };
        }

        let (status, message) = match summary.suggested_action {
            SuggestedAction::Archive => match self.actions.archive(&summary.email_id).await {
                Ok(()) => (ActionStatus::Success, "Archived".to_string()),
                Err(e) => {
                    warn!(email_id = %summary.email_id, error = %e, "Archive failed");
                    (ActionStatus::Failed, e.to_string())
                }
            },
            SuggestedAction::Reply => (
                ActionStatus::PendingApproval,
                "Ready for human reply".to_string(),
            ),
            SuggestedAction::Escalate => (
                ActionStatus::Success,
                "Escalated to human review".to_string(),
            ),
        };

        info!(
            email_id = %summary.email_id,
            status = status.as_str(),
            "Action resolved"
        );

        ActionResult {
            email_id: summary.email_id.clone(),
            action: summary.suggested_action,
            status,
            message: Some(message),
            timestamp: Utc::now(),
        }
    }
}
