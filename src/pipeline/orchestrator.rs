//! Orchestrator — composes the fetch → summarize → act pipeline.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::info;

use crate::pipeline::action::ActionAgent;
use crate::pipeline::fetch::FetcherAgent;
use crate::pipeline::summarize::SummarizerAgent;
use crate::pipeline::types::{MailActions, MailSource, PipelineReport, SummaryOracle};

/// Coordinates one pipeline pass over a bounded batch of unread emails.
///
/// Stages run strictly in fetch → summarize → act order. Items within the
/// summarize stage fan out concurrently; `join_all` reassembles results in
/// input order, so the report lists stay positionally aligned to fetch order.
pub struct InboxOrchestrator {
    fetcher: FetcherAgent,
    summarizer: SummarizerAgent,
    action_agent: ActionAgent,
}

impl InboxOrchestrator {
    /// Create an orchestrator over the three collaborators.
    pub fn new(
        source: Arc<dyn MailSource>,
        oracle: Arc<dyn SummaryOracle>,
        actions: Arc<dyn MailActions>,
    ) -> Self {
        Self {
            fetcher: FetcherAgent::new(source),
            summarizer: SummarizerAgent::new(oracle),
            action_agent: ActionAgent::new(actions),
        }
    }

    /// Run one end-to-end pass: fetch, summarize each email, resolve each
    /// action. Never fails — collaborator failures degrade per stage.
    pub async fn process_batch(&self, max_emails: usize, require_approval: bool) -> PipelineReport {
        info!(max_emails, require_approval, "Starting pipeline pass");

        let emails = self.fetcher.fetch_emails(max_emails).await;
        if emails.is_empty() {
            info!("No emails to process");
            return PipelineReport::empty();
        }

        let summaries = join_all(
            emails
                .iter()
                .map(|email| self.summarizer.summarize_and_suggest(email)),
        )
        .await;

        let mut actions = Vec::with_capacity(summaries.len());
        for summary in &summaries {
            actions.push(
                self.action_agent
                    .execute_action(summary, require_approval)
                    .await,
            );
        }

        info!(total_emails = emails.len(), "Pipeline pass complete");

        PipelineReport {
            total_emails: emails.len(),
            summaries,
            actions,
            timestamp: Utc::now(),
        }
    }
}
