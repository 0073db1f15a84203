//! Configuration types.

/// Assistant configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Assistant name for identification.
    pub name: String,
    /// Default upper bound on emails fetched per pipeline pass.
    pub max_emails: usize,
    /// Whether actions require human approval by default.
    pub require_approval: bool,
    /// HTTP listen port.
    pub port: u16,
    /// LLM model used for summarization.
    pub model: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "inbox-pilot".to_string(),
            max_emails: 10,
            require_approval: true,
            port: 5000,
            model: "gpt-4o-mini".to_string(),
        }
    }
}
