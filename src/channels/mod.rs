//! Mail channel adapters — pure I/O, no business logic.

pub mod gmail;

pub use gmail::GmailClient;
