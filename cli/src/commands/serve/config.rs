//! # Serve Command Configuration
//!
//! File: cli/src/commands/serve/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Settings for `gitabot serve` come from three places, lowest priority first:
//! 1. Built-in defaults
//! 2. The layered TOML configuration (user `config.toml`, then `.gitabot.toml`
//!    or the file given with `--config`) plus environment secrets
//! 3. Flags given on the command line
//!
//! Only flags that were actually passed override the file values.
//!
use crate::core::config::{load_config, validate_config, Config};
use crate::core::error::Result;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::debug;

/// # Serve Command Arguments (`ServeArgs`)
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Configuration file to use instead of the nearest `.gitabot.toml`.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Address to bind, e.g. `0.0.0.0` for all interfaces.
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on.
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Path of the scripture dataset JSON file.
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Path of the user-state JSON file.
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Do not send CORS headers.
    #[arg(long)]
    pub no_cors: bool,
}

/// # Load and Merge Configuration (`load_and_merge_config`)
///
/// Loads the layered configuration and applies the command-line overrides.
///
/// ## Errors
///
/// Returns an error if loading fails or the merged result is invalid.
pub fn load_and_merge_config(args: &ServeArgs) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;
    apply_args(&mut config, args);
    validate_config(&config)?;
    Ok(config)
}

/// Overrides `config` with every flag present in `args`.
pub fn apply_args(config: &mut Config, args: &ServeArgs) {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(path) = &args.dataset {
        config.dataset.path = path.display().to_string();
    }
    if let Some(path) = &args.state {
        config.state.path = path.display().to_string();
    }
    if args.no_cors {
        config.server.enable_cors = false;
    }
    debug!("Configuration after command-line overrides: {:?}", config.server);
}
