//! Email processing pipeline: fetch → summarize → act.

pub mod action;
pub mod fetch;
pub mod orchestrator;
pub mod summarize;
pub mod types;

pub use action::ActionAgent;
pub use fetch::FetcherAgent;
pub use orchestrator::InboxOrchestrator;
pub use summarize::SummarizerAgent;
pub use types::{
    ActionResult, ActionStatus, FetchedEmail, MailActions, MailSource, PipelineReport, RawEmail,
    SuggestedAction, SummaryOracle, SummaryResult,
};
