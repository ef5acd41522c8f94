//! Key-value persistence for game state and history.
//!
//! Reads are synchronous and served from memory. Writes are fire-and-forget:
//! callers never wait on them, and the outcome is only visible through
//! [`KeyValueStore::sync_status`].

mod file;
mod memory;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

pub use file::FileStore;
pub use memory::MemoryStore;

pub const GAME_STATE_KEY: &str = "quiz-game-state";
pub const HISTORY_KEY: &str = "quiz-history";

/// Outcome of the most recent writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    Pending,
    Error(String),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Synced => f.write_str("synced"),
            SyncStatus::Pending => f.write_str("saving"),
            SyncStatus::Error(e) => write!(f, "save failed: {e}"),
        }
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`. Never blocks on the backing medium.
    fn set(&self, key: &str, value: Value);

    fn sync_status(&self) -> SyncStatus;
}

/// Reads `key`, falling back to `default` when missing or unreadable.
pub fn load_or<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    let Some(value) = store.get(key) else {
        return default;
    };
    match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable stored value");
            default
        }
    }
}

pub fn save<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(value) => store.set(key, value),
        Err(e) => warn!(key, error = %e, "failed to serialize value for storage"),
    }
}
