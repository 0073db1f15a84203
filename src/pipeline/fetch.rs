//! Fetch agent — pulls a bounded batch of unread emails from a mail source.

use std::sync::Arc;

use tracing::{error, info};

use crate::pipeline::types::{FetchedEmail, MailSource};

/// Agent responsible for the fetch stage.
///
/// A fetch failure is absorbed: the agent logs the condition and returns an
/// empty batch, degrading the whole pass to a no-op rather than propagating
/// the error.
pub struct FetcherAgent {
    source: Arc<dyn MailSource>,
}

impl FetcherAgent {
    /// Create a new fetch agent over a mail source.
    pub fn new(source: Arc<dyn MailSource>) -> Self {
        Self { source }
    }

    /// Fetch up to `max_results` unread emails.
    pub async fn fetch_emails(&self, max_results: usize) -> Vec<FetchedEmail> {
        info!(max_results, "Fetching unread emails");

        match self.source.list_unread(max_results).await {
            Ok(raw) => {
                let emails: Vec<FetchedEmail> =
                    raw.into_iter().map(FetchedEmail::from_raw).collect();
                info!(count = emails.len(), "Fetched unread emails");
                emails
            }
            Err(e) => {
                error!(error = %e, "Mail source fetch failed, returning empty batch");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use crate::pipeline::types::RawEmail;
    use async_trait::async_trait;

    struct StaticSource {
        emails: Vec<RawEmail>,
    }

    #[async_trait]
    impl MailSource for StaticSource {
        async fn list_unread(&self, max_results: usize) -> Result<Vec<RawEmail>, ChannelError> {
            Ok(self.emails.iter().take(max_results).cloned().collect())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MailSource for FailingSource {
        async fn list_unread(&self, _max_results: usize) -> Result<Vec<RawEmail>, ChannelError> {
            Err(ChannelError::FetchFailed {
                name: "test".into(),
                reason: "connection refused".into(),
            })
        }
    }

    fn raw(id: &str) -> RawEmail {
        RawEmail {
            id: id.into(),
            subject: Some(format!("Subject {id}")),
            from: Some("alice@example.com".into()),
            snippet: Some("hello".into()),
        }
    }

    #[tokio::test]
    async fn fetch_respects_bound_and_order() {
        let source = Arc::new(StaticSource {
            emails: vec![raw("a"), raw("b"), raw("c")],
        });
        let agent = FetcherAgent::new(source);

        let emails = agent.fetch_emails(2).await;
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].id, "a");
        assert_eq!(emails[1].id, "b");
    }

    #[tokio::test]
    async fn fetch_failure_yields_empty_batch() {
        let agent = FetcherAgent::new(Arc::new(FailingSource));
        let emails = agent.fetch_emails(10).await;
        assert!(emails.is_empty());
    }

    #[tokio::test]
    async fn fetch_normalizes_missing_fields() {
        let source = Arc::new(StaticSource {
            emails: vec![RawEmail {
                id: "bare".into(),
                subject: None,
                from: None,
                snippet: None,
            }],
        });
        let agent = FetcherAgent::new(source);

        let emails = agent.fetch_emails(5).await;
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].subject, "(no subject)");
        assert_eq!(emails[0].sender, "(unknown)");
    }
}
