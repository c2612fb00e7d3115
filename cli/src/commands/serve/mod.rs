//! # gitabot HTTP Server
//!
//! File: cli/src/commands/serve/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `gitabot serve` runs the public HTTP surface of the bot:
//! - `GET /verse-details` for structured verse lookups
//! - `GET /webhook` for the WhatsApp verification handshake
//! - `POST /webhook` for inbound chat messages
//!
//! ## Architecture
//!
//! - `config.rs`: command-line flags layered over the loaded configuration
//! - `server_logic.rs`: state wiring, router construction and the serve loop
//! - `handlers.rs`: the axum request handlers and error-to-status mapping
//!
//! ## Examples
//!
//! ```bash
//! # Serve with the configuration found in .gitabot.toml
//! gitabot serve
//!
//! # Listen on all interfaces with a specific dataset
//! gitabot -v serve --host 0.0.0.0 --port 8080 --dataset data/dataset_english.json
//! ```
//!
use crate::core::error::Result;
use tracing::info;

pub use config::ServeArgs;

pub mod config;
pub mod handlers;
pub mod server_logic;

/// # Handle Serve Command (`handle_serve`)
///
/// Resolves the effective configuration and runs the server until a shutdown
/// signal arrives.
///
/// ## Errors
///
/// Returns an error if the configuration is invalid, the dataset or user
/// state cannot be loaded, or the listener cannot bind.
pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    info!("Handling serve command with args: {:?}", args);
    let config = config::load_and_merge_config(&args)?;
    info!(
        "Effective server settings: {}:{} (cors: {})",
        config.server.host, config.server.port, config.server.enable_cors
    );
    server_logic::run_server(config).await
}
