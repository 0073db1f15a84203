//! In-memory state stores: long-term memory and per-conversation sessions.
//!
//! Both are volatile by design — nothing here survives a process restart.

pub mod memory;
pub mod session;

pub use memory::MemoryBank;
pub use session::{ConversationMessage, Session, SessionStore};
