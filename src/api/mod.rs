//! HTTP API server for solace gateway

pub mod chat;
pub mod health;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::alert::{AlertSink, DEFAULT_CONTEXT_TURNS};
use crate::llm::ChatModel;
use crate::persona::Persona;
use crate::session::ConversationStore;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Per-session conversation memory
    pub store: Arc<ConversationStore>,
    pub model: Arc<dyn ChatModel>,
    pub alerts: Arc<dyn AlertSink>,
    pub persona: Persona,
    /// Recent turns attached to each crisis alert
    pub alert_context_turns: usize,
}

impl ApiState {
    #[must_use]
    pub fn new(
        store: Arc<ConversationStore>,
        model: Arc<dyn ChatModel>,
        alerts: Arc<dyn AlertSink>,
        persona: Persona,
    ) -> Self {
        Self {
            store,
            model,
            alerts,
            persona,
            alert_context_turns: DEFAULT_CONTEXT_TURNS,
        }
    }

    /// Change how many turns an alert carries
    #[must_use]
    pub fn with_alert_context_turns(mut self, turns: usize) -> Self {
        self.alert_context_turns = turns;
        self
    }
}

/// Build the API router without static files
pub fn router(state: Arc<ApiState>) -> Router {
    with_layers(routes(state))
}

fn routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .nest("/api", chat::router(state.clone()))
        .merge(health::router(state))
}

fn with_layers(router: Router) -> Router {
    // CORS layer for cross-origin requests from frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    state: ApiState,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub const fn new(state: ApiState, port: u16) -> Self {
        Self {
            state,
            port,
            static_dir: None,
        }
    }

    /// Serve a web UI from this directory for non-API paths
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(self.state),
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes and the static UI fallback
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = routes(self.state.clone());

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        with_layers(router)
    }

    /// Run the API server until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        let sweeper = self.state.store.spawn_sweeper();

        tracing::info!(
            port = self.port,
            persona = %self.state.persona.name,
            model = self.state.model.model_id(),
            alerts = self.state.alerts.name(),
            "API server listening"
        );

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }

        served.map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;
        tracing::info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
