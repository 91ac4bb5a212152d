use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use leadflow_engine::OutreachOrchestrator;
use leadflow_settings::{ServerSettings, Settings};

use crate::handlers;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<OutreachOrchestrator>,
    pub settings: Arc<RwLock<Settings>>,
    pub settings_path: Arc<PathBuf>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/agents", get(handlers::agents))
        .route("/leads", get(handlers::list_leads).post(handlers::add_lead))
        .route(
            "/leads/{id}",
            get(handlers::get_lead).delete(handlers::remove_lead),
        )
        .route("/leads/{id}/draft", put(handlers::edit_draft))
        .route("/leads/{id}/outreach", post(handlers::generate_outreach))
        .route("/leads/{id}/send", post(handlers::send_email))
        .route("/tracking", get(handlers::tracking_report))
        .route("/tracking/check", post(handlers::check_responses))
        .route("/activity", get(handlers::activity))
        .route("/pending", get(handlers::pending))
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::save_settings),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the listener and serve in the background.
pub async fn start(config: &ServerSettings, state: AppState) -> Result<ServerHandle, std::io::Error> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let local_addr = listener.local_addr()?;
    let router = build_router(state);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(signal.cancelled_owned())
            .await
        {
            tracing::error!(error = %e, "server stopped with error");
        }
    });

    tracing::info!(addr = %local_addr, "leadflow server started");

    Ok(ServerHandle {
        addr: local_addr,
        shutdown,
        server,
    })
}

/// Handle returned by `start()`. Dropping it leaves the server running.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown: CancellationToken,
    server: JoinHandle<()>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.server.await {
            tracing::warn!(error = %e, "server task did not exit cleanly");
        }
        tracing::info!("leadflow server stopped");
    }
}
