//! # gitabot Server Logic
//!
//! File: cli/src/commands/serve/server_logic.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Wires the loaded dataset, chat router and message sender into an axum
//! [`Router`], then serves it until Ctrl+C or SIGTERM.
//!
//! ## Architecture
//!
//! - [`AppState`] is cloned into every handler; all members are shared
//!   read-only (`Arc`) except the user-state store, which serializes its own
//!   writes.
//! - [`create_app`] builds the routes and the middleware stack (tracing, then
//!   CORS) so tests can drive the router without binding a socket.
//! - [`run_server`] loads everything, prints a startup banner and runs the
//!   serve loop with graceful shutdown.
//!
use super::handlers;
use crate::chat::build_router;
use crate::chat::router::ChatRouter;
use crate::chat::whatsapp::{LoggingSender, MessageSender, WhatsAppClient};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::scripture::dataset::Dataset;
use anyhow::Context;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub router: Arc<ChatRouter>,
    pub sender: Arc<dyn MessageSender>,
    pub verify_token: Option<String>,
}

/// # Run Server (`run_server`)
///
/// Loads the dataset and user state, builds the chat router (including the
/// embedding index when enabled), binds the configured address and serves
/// until a shutdown signal arrives.
///
/// ## Errors
///
/// Returns an error if the dataset or user state cannot be loaded, the
/// templates fail to compile, or the listener cannot bind.
pub async fn run_server(config: Config) -> Result<()> {
    let dataset = Arc::new(Dataset::load(Path::new(&config.dataset.path))?);
    let router = Arc::new(build_router(&config, Arc::clone(&dataset)).await?);

    let sender: Arc<dyn MessageSender> = match WhatsAppClient::from_config(&config.whatsapp) {
        Some(client) => {
            info!("Sending replies via {}", client.messages_url());
            Arc::new(client)
        }
        None => {
            warn!("WhatsApp access token or phone number id missing; replies will only be logged");
            Arc::new(LoggingSender)
        }
    };
    if config.whatsapp.verify_token.is_none() {
        warn!("No webhook verify token configured; GET /webhook will always answer 403");
    }

    let state = AppState {
        dataset: Arc::clone(&dataset),
        router,
        sender,
        verify_token: config.whatsapp.verify_token.clone(),
    };
    let app = create_app(state, config.server.enable_cors);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    println!("\n=================================================================");
    println!(
        "📖 Dataset:           {} ({} chapters, {} verses)",
        config.dataset.path,
        dataset.chapter_count(),
        dataset.verse_count()
    );
    println!("💾 User state:        {}", config.state.path);
    println!("🌐 Listening on:      http://{}", addr);
    println!("🔒 CORS enabled:      {}", config.server.enable_cors);
    println!("🧭 Semantic search:   {}", config.embedding.enabled);
    println!("=================================================================\n");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener to address {}", addr))?;
    info!("gitabot listening on {}", addr);
    println!("Server starting! Press Ctrl+C to stop.");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    println!("\nServer shutdown complete.");
    Ok(())
}

/// # Create Application Router (`create_app`)
///
/// Registers `/verse-details` and `/webhook`, then wraps the router in the
/// tracing and CORS layers.
pub fn create_app(state: AppState, enable_cors: bool) -> Router {
    let cors_layer = if enable_cors {
        info!("CORS middleware enabled (permissive).");
        CorsLayer::permissive()
    } else {
        info!("CORS middleware disabled.");
        CorsLayer::new()
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/verse-details", get(handlers::verse_details))
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .with_state(state)
        .layer(ServiceBuilder::new().layer(trace_layer).layer(cors_layer))
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
