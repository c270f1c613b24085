//! Crisis alert payloads and delivery
//!
//! When the detector flags a message, the chat handler builds a
//! [`CrisisAlert`] and hands it to [`dispatch_detached`]. Delivery happens
//! on its own task; the chat response never waits on it and never sees its
//! errors.

mod smtp;

pub use smtp::{SmtpAlertSink, SmtpConfig};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::session::{Role, Turn};

/// Default number of recent turns included in an alert
pub const DEFAULT_CONTEXT_TURNS: usize = 10;

/// Everything a reviewer needs to act on a flagged message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrisisAlert {
    /// Persona display name, used to label assistant turns
    pub persona_name: String,
    /// The user message that matched a crisis rule
    pub triggering_message: String,
    /// The reply the persona gave
    pub reply: String,
    /// Recent history, oldest first
    pub recent: Vec<Turn>,
    pub detected_at: DateTime<Utc>,
}

impl CrisisAlert {
    #[must_use]
    pub fn new(
        persona_name: impl Into<String>,
        triggering_message: impl Into<String>,
        reply: impl Into<String>,
        recent: Vec<Turn>,
    ) -> Self {
        Self {
            persona_name: persona_name.into(),
            triggering_message: triggering_message.into(),
            reply: reply.into(),
            recent,
            detected_at: Utc::now(),
        }
    }

    /// Email subject line
    #[must_use]
    pub fn subject(&self) -> String {
        format!("🚨 CRISIS ALERT - {} session", self.persona_name)
    }

    /// Plain-text alert body
    #[must_use]
    pub fn body(&self) -> String {
        let transcript = self
            .recent
            .iter()
            .map(|turn| format!("{}: {}", self.speaker(turn.role), turn.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "CRISIS ALERT - {name} session\n\n\
             Time: {time}\n\n\
             TRIGGERING MESSAGE:\n{trigger}\n\n\
             RECENT CONVERSATION CONTEXT:\n{transcript}\n\n\
             {speaker} RESPONSE:\n{reply}\n\n\
             ---\n\
             Automated alert from the {name} conversation service.\n\
             Please review and take appropriate action.",
            name = self.persona_name,
            time = self.detected_at.to_rfc3339(),
            trigger = self.triggering_message,
            speaker = self.persona_name.to_uppercase(),
            reply = self.reply,
        )
    }

    fn speaker(&self, role: Role) -> &str {
        match role {
            Role::User => "User",
            Role::Assistant => self.persona_name.as_str(),
        }
    }
}

/// Destination for crisis alerts
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name for logs and the status endpoint
    fn name(&self) -> &'static str;

    /// Whether alerts actually leave the process
    fn delivers(&self) -> bool {
        true
    }

    /// Deliver one alert
    ///
    /// # Errors
    ///
    /// Returns error if the alert cannot be delivered
    async fn dispatch(&self, alert: &CrisisAlert) -> Result<()>;
}

/// Fallback sink when no delivery channel is configured
///
/// Records that an alert was raised without logging message content.
#[derive(Debug, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn delivers(&self) -> bool {
        false
    }

    async fn dispatch(&self, alert: &CrisisAlert) -> Result<()> {
        tracing::warn!(
            persona = %alert.persona_name,
            detected_at = %alert.detected_at,
            context_turns = alert.recent.len(),
            "crisis alert raised but no alert delivery is configured"
        );
        Ok(())
    }
}

/// Deliver an alert on a background task
///
/// Failures are logged inside the task and never propagate to the caller.
pub fn dispatch_detached(
    sink: Arc<dyn AlertSink>,
    alert: CrisisAlert,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match sink.dispatch(&alert).await {
            Ok(()) => tracing::info!(sink = sink.name(), "crisis alert dispatched"),
            Err(e) => {
                tracing::error!(sink = sink.name(), error = %e, "failed to send crisis alert");
            }
        }
    })
}
