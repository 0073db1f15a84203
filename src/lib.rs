//! Inbox Pilot — multi-agent email triage core.

pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod observe;
pub mod pipeline;
pub mod server;
pub mod store;
