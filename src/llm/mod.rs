//! LLM integration — OpenAI chat-completions summarization oracle.
//!
//! One tight call per email: the prompt asks for the strict JSON shape the
//! pipeline parses (`summary` / `action` / `confidence`); the pipeline's
//! fallback policy covers replies that ignore the instruction.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::pipeline::types::{FetchedEmail, SummaryOracle};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Max tokens per summarization call (runs on every email — kept tight).
const SUMMARY_MAX_TOKENS: u32 = 400;

/// Temperature for summarization (deterministic-ish).
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
}

impl OpenAiClient {
    /// Create a client for the given model.
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.into(),
        }
    }

    /// Model in use.
    pub fn model(&self) -> &str {
        &self.model
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_system_prompt() -> String {
    "You summarize emails concisely and suggest a follow-up action.".to_string()
}

fn build_user_prompt(email: &FetchedEmail) -> String {
    format!(
        "Summarize this email in 1-2 sentences and suggest an action (reply/archive/escalate).\n\
         From: {}\n\
         Subject: {}\n\
         Body: {}\n\n\
         Format your response as JSON: \
         {{\"summary\": \"...\", \"action\": \"reply|archive|escalate\", \"confidence\": 0.0-1.0}}",
        email.sender, email.subject, email.snippet
    )
}

#[async_trait]
impl SummaryOracle for OpenAiClient {
    async fn summarize(&self, email: &FetchedEmail) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: build_system_prompt(),
                },
                WireMessage {
                    role: "user",
                    content: build_user_prompt(email),
                },
            ],
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: SUMMARY_TEMPERATURE,
        };

        debug!(email_id = %email.id, model = %self.model, "Requesting summarization");

        let response = self
            .http
            .post(OPENAI_CHAT_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::AuthFailed {
                provider: "openai".to_string(),
            });
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("status {status}: {body}"),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: "empty choices array".to_string(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> FetchedEmail {
        FetchedEmail {
            id: "m1".into(),
            subject: "Quarterly invoice".into(),
            sender: "billing@vendor.com".into(),
            snippet: "Please find attached".into(),
            body: None,
        }
    }

    #[test]
    fn user_prompt_includes_email_fields() {
        let prompt = build_user_prompt(&email());
        assert!(prompt.contains("billing@vendor.com"));
        assert!(prompt.contains("Quarterly invoice"));
        assert!(prompt.contains("Please find attached"));
        assert!(prompt.contains("reply|archive|escalate"));
    }

    #[test]
    fn request_serializes_expected_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![WireMessage {
                role: "user",
                content: "hi".into(),
            }],
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: SUMMARY_TEMPERATURE,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 400);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_deserializes_content() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "ok");
    }
}
