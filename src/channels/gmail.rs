//! Gmail REST adapter implementing the mail source and side-effect traits.
//!
//! Authenticates with a ready-made OAuth access token; obtaining and
//! refreshing the token happens outside this process.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::ChannelError;
use crate::pipeline::types::{MailActions, MailSource, RawEmail};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Gmail REST client.
pub struct GmailClient {
    http: reqwest::Client,
    access_token: SecretString,
}

impl GmailClient {
    /// Create a client around an OAuth access token.
    pub fn new(access_token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
        }
    }

    fn check_status(response: &reqwest::Response, what: &str) -> Result<(), ChannelError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ChannelError::AuthFailed {
                name: "gmail".to_string(),
            });
        }
        if !status.is_success() {
            return Err(ChannelError::FetchFailed {
                name: "gmail".to_string(),
                reason: format!("{what} returned status {status}"),
            });
        }
        Ok(())
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct MessageMeta {
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Debug, Default, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

/// Look up a header by name, case-insensitively.
fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Convert a metadata response into the pipeline's wire record.
fn raw_from_meta(id: String, meta: MessageMeta) -> RawEmail {
    let headers = meta.payload.map(|p| p.headers).unwrap_or_default();
    RawEmail {
        id,
        subject: header_value(&headers, "Subject").map(str::to_string),
        from: header_value(&headers, "From").map(str::to_string),
        snippet: meta.snippet,
    }
}

#[async_trait]
impl MailSource for GmailClient {
    async fn list_unread(&self, max_results: usize) -> Result<Vec<RawEmail>, ChannelError> {
        let url = format!("{GMAIL_API_BASE}/users/me/messages");
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token.expose_secret())
            .query(&[
                ("q", "is:unread".to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .await?;
        Self::check_status(&response, "message list")?;

        let list: MessageList = response.json().await?;
        debug!(count = list.messages.len(), "Listed unread messages");

        let mut emails = Vec::with_capacity(list.messages.len());
        for message in list.messages {
            let url = format!("{GMAIL_API_BASE}/users/me/messages/{}", message.id);
            let response = self
                .http
                .get(&url)
                .bearer_auth(self.access_token.expose_secret())
                .query(&[
                    ("format", "metadata"),
                    ("metadataHeaders", "Subject"),
                    ("metadataHeaders", "From"),
                ])
                .send()
                .await?;
            Self::check_status(&response, "message fetch")?;

            let meta: MessageMeta = response.json().await?;
            emails.push(raw_from_meta(message.id, meta));
        }

        Ok(emails)
    }
}

#[async_trait]
impl MailActions for GmailClient {
    async fn archive(&self, email_id: &str) -> Result<(), ChannelError> {
        let url = format!("{GMAIL_API_BASE}/users/me/messages/{email_id}/modify");
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&serde_json::json!({
                "removeLabelIds": ["UNREAD", "INBOX"],
            }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ChannelError::AuthFailed {
                name: "gmail".to_string(),
            });
        }
        if !status.is_success() {
            return Err(ChannelError::ModifyFailed {
                name: "gmail".to_string(),
                reason: format!("modify returned status {status}"),
            });
        }

        debug!(email_id = %email_id, "Archived message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = vec![
            Header {
                name: "SUBJECT".into(),
                value: "Hello".into(),
            },
            Header {
                name: "From".into(),
                value: "alice@example.com".into(),
            },
        ];
        assert_eq!(header_value(&headers, "Subject"), Some("Hello"));
        assert_eq!(header_value(&headers, "from"), Some("alice@example.com"));
        assert_eq!(header_value(&headers, "Date"), None);
    }

    #[test]
    fn meta_converts_to_raw_email() {
        let meta: MessageMeta = serde_json::from_str(
            r#"{
                "snippet": "preview text",
                "payload": {
                    "headers": [
                        {"name": "Subject", "value": "Invoice"},
                        {"name": "From", "value": "billing@vendor.com"}
                    ]
                }
            }"#,
        )
        .unwrap();

        let raw = raw_from_meta("m1".into(), meta);
        assert_eq!(raw.id, "m1");
        assert_eq!(raw.subject.as_deref(), Some("Invoice"));
        assert_eq!(raw.from.as_deref(), Some("billing@vendor.com"));
        assert_eq!(raw.snippet.as_deref(), Some("preview text"));
    }

    #[test]
    fn meta_tolerates_missing_payload() {
        let meta: MessageMeta = serde_json::from_str(r#"{"snippet": "preview"}"#).unwrap();
        let raw = raw_from_meta("m2".into(), meta);
        assert_eq!(raw.subject, None);
        assert_eq!(raw.from, None);
    }

    #[test]
    fn empty_message_list_deserializes() {
        let list: MessageList = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(list.messages.is_empty());
    }
}
