//! Chat relay endpoints
//!
//! `POST /api/chat` records the user turn, scans it for crisis language,
//! asks the model for a reply over the full session history and records
//! that reply. Flagged messages raise a [`CrisisAlert`] on a detached task.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::alert::{CrisisAlert, dispatch_detached};
use crate::crisis;
use crate::session::Turn;

const MISSING_FIELDS: &str = "Message and sessionId required";
const MODEL_FAILURE: &str = "Something went wrong. Please try again.";

// --- Request/Response types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub is_crisis: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Treat a missing or empty field the same way
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// --- Handlers ---

/// Relay one user message to the model
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (Some(message), Some(session_id)) = (non_empty(req.message), non_empty(req.session_id))
    else {
        return Err(error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS));
    };

    state.store.append(&session_id, Turn::user(message.clone()));

    let flagged = crisis::categories(&message);
    let is_crisis = !flagged.is_empty();
    if is_crisis {
        tracing::warn!(
            categories = ?flagged,
            "crisis language detected"
        );
    }

    let history = state.store.history(&session_id);
    let reply = state
        .model
        .complete(&state.persona.system_prompt, &history)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                model = state.model.model_id(),
                turns = history.len(),
                "model call failed"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, MODEL_FAILURE)
        })?;

    // The session may have been cleared or pruned while the model ran
    let recorded = state.store.append_if_present(&session_id, Turn::assistant(reply.clone()));
    if !recorded {
        tracing::debug!("session ended before the reply was recorded");
    }

    if is_crisis {
        let recent = if recorded {
            state.store.recent(&session_id, state.alert_context_turns)
        } else {
            let exchange = [Turn::user(message.clone()), Turn::assistant(reply.clone())];
            let skip = exchange.len().saturating_sub(state.alert_context_turns);
            exchange.into_iter().skip(skip).collect()
        };
        let alert = CrisisAlert::new(state.persona.name.clone(), message, reply.clone(), recent);
        dispatch_detached(state.alerts.clone(), alert);
    }

    tracing::debug!(
        turns = state.store.turn_count(&session_id),
        is_crisis,
        "chat turn complete"
    );

    Ok(Json(ChatResponse {
        message: reply,
        is_crisis,
    }))
}

/// Forget a session's history
async fn clear(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ClearRequest>,
) -> Json<ClearResponse> {
    if let Some(session_id) = non_empty(req.session_id) {
        let removed = state.store.clear(&session_id);
        tracing::debug!(removed, "session cleared");
    }

    Json(ClearResponse { success: true })
}

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/clear", post(clear))
        .with_state(state)
}
