//! Memory bank — long-term key/value store with lazy TTL expiry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A single stored fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Key, unique within the bank.
    pub key: String,
    /// Arbitrary value.
    pub value: serde_json::Value,
    /// When the entry was stored (reset on overwrite).
    pub timestamp: DateTime<Utc>,
    /// Time-to-live in seconds; `None` means permanent.
    pub ttl_seconds: Option<u64>,
}

impl MemoryEntry {
    /// Whether the entry's TTL has elapsed at `now`.
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.ttl_seconds {
            Some(ttl) => now.signed_duration_since(self.timestamp).num_seconds() > ttl as i64,
            None => false,
        }
    }
}

/// Long-term key/value memory shared across concurrent callers.
///
/// Expiry is lazy: an entry past its TTL is deleted as a side effect of the
/// read that discovers it. There is no background sweep, so an expired entry
/// that is never read again stays resident until overwritten or deleted —
/// `list_keys` reflects that.
#[derive(Default)]
pub struct MemoryBank {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryBank {
    /// Create an empty memory bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, unconditionally. Overwriting resets both the
    /// timestamp and the TTL.
    pub async fn store(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
        ttl_seconds: Option<u64>,
    ) {
        let key = key.into();
        let entry = MemoryEntry {
            key: key.clone(),
            value,
            timestamp: Utc::now(),
            ttl_seconds,
        };
        self.entries.write().await.insert(key.clone(), entry);
        info!(key = %key, ttl_seconds, "Stored memory entry");
    }

    /// Retrieve a value. An entry whose TTL has elapsed is deleted here and
    /// reported absent.
    pub async fn retrieve(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.write().await;
        let entry = entries.get(key)?;

        if entry.is_expired(Utc::now()) {
            entries.remove(key);
            info!(key = %key, "Memory entry expired");
            return None;
        }

        debug!(key = %key, "Retrieved memory entry");
        Some(entry.value.clone())
    }

    /// Delete an entry. No-op if absent.
    pub async fn delete(&self, key: &str) {
        if self.entries.write().await.remove(key).is_some() {
            info!(key = %key, "Deleted memory entry");
        }
    }

    /// All currently stored keys, including logically expired entries that
    /// no read has reaped yet. A listed key is not guaranteed retrievable.
    pub async fn list_keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("Cleared all memory entries");
    }
}
