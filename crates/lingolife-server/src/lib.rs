//! HTTP API for lingolife.
//!
//! Serves the word repository, the dictionary proxy and account endpoints
//! over axum. All bodies are JSON; failures are `{"error": message}`.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lingolife_dictionary::create_dictionary;
use lingolife_store::open_backend;

pub use config::{load_config, load_config_from, LingoConfig, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

use crate::auth::TokenKeys;

/// The full application with middleware applied.
pub fn router(state: AppState) -> Router {
    routes::api_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire the storage backend, dictionary and token keys from configuration.
pub async fn build_state(config: &LingoConfig) -> Result<AppState> {
    let backend = open_backend(&config.database)
        .await
        .context("failed to open word storage")?;
    let dictionary = create_dictionary(&config.youdao)?;
    let tokens = TokenKeys::new(config.server.jwt_secret(), config.server.token_ttl_days);
    tracing::info!(
        backend = ?backend.kind,
        dictionary = dictionary.name(),
        "application state ready"
    );
    Ok(AppState::new(backend, Arc::from(dictionary), tokens))
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: LingoConfig) -> Result<()> {
    let state = build_state(&config).await?;
    let app = router(state);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
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
