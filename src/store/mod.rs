//! Store module for shared conversations
//!
//! A conversation is an opaque JSON payload saved under a short random id so it
//! can be fetched again later. Conversations live in memory only and expire.

mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Length of generated conversation ids
pub const ID_LENGTH: usize = 8;

/// Short random identifier of a saved conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn generate() -> Self {
        Self(nanoid::nanoid!(ID_LENGTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for conversation store implementations
///
/// Implementations must be safe to share between request handlers.
pub trait ConversationStore: Send + Sync {
    /// Saves a payload and returns its new id
    fn put(&self, payload: Value) -> ConversationId;

    /// Looks up a payload; expired or unknown ids yield None
    fn get(&self, id: &ConversationId) -> Option<Value>;
}
