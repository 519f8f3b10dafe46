mod auth;
mod config;
mod data_client;
mod errors;
mod itinerary;
mod listing;
mod models;
mod notifications;
mod places;
mod plans;
mod profile;
mod reviews;
mod routes;
mod saved;
mod scope;
mod social;
mod state;
mod submissions;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::gotrue::GoTrueClient;
use crate::config::Config;
use crate::data_client::postgrest::PostgrestClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::submissions::SubmissionGuard;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting guide API v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client shared by the data and auth APIs
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let data = Arc::new(PostgrestClient::new(
        http.clone(),
        &config.supabase_url,
        config.supabase_anon_key.clone(),
    ));
    let auth = Arc::new(GoTrueClient::new(
        http,
        &config.supabase_url,
        config.supabase_anon_key.clone(),
    ));
    info!("Backend clients initialized ({})", config.supabase_url);

    let shutdown = CancellationToken::new();

    let state = AppState {
        data,
        auth,
        config: config.clone(),
        submissions: SubmissionGuard::new(),
        shutdown: shutdown.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the app's web build has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C and cancels every open request scope.
async fn shutdown_signal(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
            token.cancel();
        }
        Err(e) => {
            // Without a signal handler the server simply runs until killed.
            tracing::error!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}
