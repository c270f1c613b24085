//! Solace Gateway - Conversational relay with crisis detection
//!
//! This library provides the core functionality for the Solace gateway:
//! - Crisis language detection over inbound messages
//! - Bounded per-session conversation memory
//! - Model calls through the Anthropic Messages API
//! - Fire-and-forget crisis alerts over SMTP
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 HTTP API (axum)                      │
//! │   /api/chat  │  /api/clear  │  /health  │  static   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Solace Gateway                       │
//! │   Crisis Detector  │  Conversation Store  │ Persona │
//! └──────────┬─────────────────────────────┬────────────┘
//!            │                             │
//! ┌──────────▼──────────┐       ┌──────────▼───────────┐
//! │   Anthropic API     │       │   Alert sink (SMTP)  │
//! └─────────────────────┘       └──────────────────────┘
//! ```

pub mod alert;
pub mod api;
pub mod config;
pub mod crisis;
pub mod error;
pub mod llm;
pub mod persona;
pub mod session;

pub use alert::{AlertSink, CrisisAlert, LogAlertSink, SmtpAlertSink};
pub use config::Config;
pub use crisis::CrisisCategory;
pub use error::{Error, Result};
pub use llm::{AnthropicClient, ChatModel};
pub use persona::Persona;
pub use session::{ConversationStore, Role, Turn};
