//! Anthropic Messages API client

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::ChatModel;
use crate::session::Turn;
use crate::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

const API_VERSION: &str = "2023-06-01";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat client for Claude models
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
}

/// Messages API request
#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Turn],
}

/// Messages API response
#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ResponseContent>,
}

/// Response content block
#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl AnthropicClient {
    /// Create a new client with default model, token limit and timeout
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: SecretString) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn with_timeout(api_key: SecretString, timeout: Duration) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(
                "Anthropic API key required for chat".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Use a specific model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Cap the reply length
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Point at a different API host (proxies, tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl ChatModel for AnthropicClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<String> {
        let request = MessageRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages: history,
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {status}: {body}")));
        }

        let result: MessageResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("parse error: {e}")))?;

        let reply = result
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .collect::<String>();

        if reply.trim().is_empty() {
            return Err(Error::Llm("empty response from model".to_string()));
        }

        tracing::debug!(
            model = %self.model,
            turns = history.len(),
            reply_chars = reply.len(),
            "model reply received"
        );
        Ok(reply)
    }
}
