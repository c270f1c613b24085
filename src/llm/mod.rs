//! Language model collaborators
//!
//! The chat handler only needs one operation: given the persona's system
//! prompt and the session history, produce the assistant's reply.

mod anthropic;

pub use anthropic::{AnthropicClient, DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

use async_trait::async_trait;

use crate::Result;
use crate::session::Turn;

/// A model that continues a conversation
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, reported by the status endpoint
    fn model_id(&self) -> &str;

    /// Generate the next assistant reply for `history`
    ///
    /// # Errors
    ///
    /// Returns error if the model call fails or yields no text
    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<String>;
}
