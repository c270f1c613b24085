//! In-memory conversation sessions
//!
//! Sessions are keyed by an opaque client-supplied identifier and hold a
//! bounded, ordered history of [`Turn`]s. Nothing here is persisted.

mod store;

pub use store::{ConversationStore, DEFAULT_MAX_TURNS};

use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation
///
/// Serializes as `{"role": "user", "content": "..."}`, the message shape
/// the Anthropic Messages API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
