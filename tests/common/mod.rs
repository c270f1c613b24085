//! Shared test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use solace_gateway::api::ApiState;
use solace_gateway::{
    AlertSink, ChatModel, ConversationStore, CrisisAlert, Error, Persona, Result, Turn,
};
use tokio::sync::mpsc;

/// Model stub that records every history it is asked to complete
pub struct ScriptedModel {
    reply: Option<String>,
    pub calls: Mutex<Vec<(String, Vec<Turn>)>>,
}

impl ScriptedModel {
    /// Always answer with `reply`
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Always fail like an unreachable API
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<Turn>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, system_prompt: &str, history: &[Turn]) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), history.to_vec()));
        self.reply
            .clone()
            .ok_or_else(|| Error::Llm("API error 529 Overloaded: upstream detail".to_string()))
    }
}

/// Alert sink that forwards every alert to a channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CrisisAlert>,
    fail: bool,
}

impl ChannelSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<CrisisAlert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx, fail: false }), rx)
    }

    /// Records the alert, then reports a delivery failure
    pub fn failing() -> (Arc<Self>, mpsc::UnboundedReceiver<CrisisAlert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx, fail: true }), rx)
    }
}

#[async_trait]
impl AlertSink for ChannelSink {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn dispatch(&self, alert: &CrisisAlert) -> Result<()> {
        let _ = self.tx.send(alert.clone());
        if self.fail {
            return Err(Error::Alert("relay refused connection".to_string()));
        }
        Ok(())
    }
}

pub fn test_persona() -> Persona {
    Persona {
        id: "tester".to_string(),
        name: "Test Persona".to_string(),
        tagline: None,
        system_prompt: "You are a test persona.".to_string(),
    }
}

/// Build API state over a fresh store
pub fn test_state(
    model: Arc<dyn ChatModel>,
    alerts: Arc<dyn AlertSink>,
    max_turns: usize,
) -> (Arc<ApiState>, Arc<ConversationStore>) {
    let store = Arc::new(ConversationStore::new(max_turns));
    let state = ApiState::new(store.clone(), model, alerts, test_persona());
    (Arc::new(state), store)
}
