//! Health and status endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// System status response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: &'static str,
    pub persona: String,
    pub model: String,
    pub active_sessions: usize,
    pub max_turns: usize,
    /// Alert sink name ("smtp", "log")
    pub alert_sink: &'static str,
    pub alerts_delivered: bool,
}

/// Persona info for API responses
#[derive(Serialize)]
pub struct PersonaInfo {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Get system status
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        persona: state.persona.name.clone(),
        model: state.model.model_id().to_string(),
        active_sessions: state.store.session_count(),
        max_turns: state.store.max_turns(),
        alert_sink: state.alerts.name(),
        alerts_delivered: state.alerts.delivers(),
    })
}

/// Get current persona info (never the system prompt)
async fn get_persona(State(state): State<Arc<ApiState>>) -> Json<PersonaInfo> {
    Json(PersonaInfo {
        id: state.persona.id.clone(),
        name: state.persona.name.clone(),
        tagline: state.persona.tagline.clone(),
    })
}

/// Build health and status router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/persona", get(get_persona))
        .with_state(state)
}
