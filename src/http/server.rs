//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with relay, waitlist and health handlers
//! - Wire up middleware (request ID, tracing, body limit)
//! - Bind the server to a listener and stop on the shutdown signal

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{ConfigError, RelayConfig, RelaySettings};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::relay::{notes, translation, BackendClient};
use crate::security::admin::require_admin_key;
use crate::waitlist::{handlers as waitlist, WaitlistStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub settings: RelaySettings,
    pub waitlist: Arc<dyn WaitlistStore>,
    pub admin_key: Option<Arc<str>>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(config: RelayConfig, waitlist: Arc<dyn WaitlistStore>) -> Result<Self, ConfigError> {
        let backend = BackendClient::from_config(&config.backend)?;

        let state = AppState {
            backend,
            settings: config.relay.clone(),
            waitlist,
            admin_key: config.admin.api_key.as_deref().map(Arc::from),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let admin = Router::new()
            .route("/api/admin/waitlist", get(waitlist::list))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_admin_key));

        Router::new()
            .route("/health", get(health))
            .route("/api/health/db", get(waitlist::db_health))
            .route("/api/visual-notes", post(notes::visual_notes))
            .route("/api/visual-translation", post(translation::visual_translation))
            .route("/api/waitlist", post(waitlist::join))
            .merge(admin)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.relay.max_body_bytes))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.url,
            require_auth = self.config.relay.require_auth,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}
