use std::sync::Arc;

use secrecy::SecretString;
use tracing::info;

use inbox_pilot::channels::GmailClient;
use inbox_pilot::config::AssistantConfig;
use inbox_pilot::error::{ConfigError, Result};
use inbox_pilot::llm::OpenAiClient;
use inbox_pilot::observe::{MetricsCollector, OverallEvaluator, RequestTracer};
use inbox_pilot::pipeline::types::{MailActions, MailSource};
use inbox_pilot::pipeline::InboxOrchestrator;
use inbox_pilot::server::{AppState, api_routes};
use inbox_pilot::store::{MemoryBank, SessionStore};

fn required_env(name: &str) -> std::result::Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = AssistantConfig::default();
    if let Ok(model) = std::env::var("OPENAI_MODEL") {
        config.model = model;
    }
    if let Ok(port) = std::env::var("INBOX_PILOT_PORT") {
        config.port = port.parse().unwrap_or(config.port);
    }

    let api_key = required_env("OPENAI_API_KEY")?;
    let gmail_token = required_env("GMAIL_ACCESS_TOKEN")?;

    let gmail = Arc::new(GmailClient::new(SecretString::from(gmail_token)));
    let oracle = Arc::new(OpenAiClient::new(
        SecretString::from(api_key),
        config.model.clone(),
    ));

    let source: Arc<dyn MailSource> = gmail.clone();
    let actions: Arc<dyn MailActions> = gmail;
    let orchestrator = Arc::new(InboxOrchestrator::new(source, oracle, actions));

    let state = AppState {
        orchestrator,
        sessions: Arc::new(SessionStore::new()),
        memory: Arc::new(MemoryBank::new()),
        metrics: Arc::new(MetricsCollector::new()),
        tracer: Arc::new(RequestTracer::new()),
        evaluator: Arc::new(OverallEvaluator::new()),
    };

    let app = api_routes(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;

    info!(
        port = config.port,
        model = %config.model,
        "{} v{} listening",
        config.name,
        env!("CARGO_PKG_VERSION")
    );

    axum::serve(listener, app).await?;
    Ok(())
}
