//! Read-only HTTP endpoints serving resolved rates to the web client.

pub mod error;
pub mod routes;

use crate::core::RateResolver;
use crate::core::config::AppConfig;
use crate::providers::{build_sources, util::http_client};
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use routes::{composite_rate_handler, eur_usd_handler, usd_rate_handler};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct AppState {
    pub resolver: RateResolver,
}

impl AppState {
    pub fn new(resolver: RateResolver) -> Arc<Self> {
        Arc::new(Self { resolver })
    }

    pub fn from_config(config: &AppConfig) -> Result<Arc<Self>> {
        let client = http_client().context("Failed to build HTTP client")?;
        Ok(Self::new(RateResolver::new(build_sources(config, client))))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/tasa-usd", get(usd_rate_handler))
        .route("/api/tasa-eur", get(composite_rate_handler))
        .route("/api/eur-usd", get(eur_usd_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &AppConfig) -> Result<()> {
    info!("Initializing rate sources...");
    let state = AppState::from_config(config)?;
    let app = router(state);

    let address = &config.server.bind;
    info!("Binding to {address}");
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
