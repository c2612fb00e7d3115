//! # gitabot Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This file is the entry point of the `gitabot` binary. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the subcommand handlers in `gitabot::commands`
//!
//! ## Examples
//!
//! ```bash
//! # Run the HTTP server with info logging
//! gitabot -v serve
//!
//! # Look up verses 2.47 and 2.48
//! gitabot lookup 2 47 48
//!
//! # Talk to the bot from the terminal
//! gitabot ask "I feel anxious"
//! ```
//!
use clap::Parser;
use gitabot::commands;
use tracing_subscriber::{fmt, EnvFilter};

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "gitabot",
    about = "📖 gitabot: Bhagavad Gita verse API and WhatsApp chatbot",
    long_about = "Serve Bhagavad Gita verses over HTTP and WhatsApp, look verses up,\n\
                  and talk to the chatbot from the terminal.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Run the verse API and WhatsApp webhook server.
    #[command(alias = "s")]
    Serve(commands::serve::ServeArgs),
    /// Print verses of one chapter as JSON.
    #[command(alias = "l")]
    Lookup(commands::lookup::LookupArgs),
    /// Send one message to the chatbot and print its reply.
    #[command(alias = "a")]
    Ask(commands::ask::AskArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Serve(args) => commands::serve::handle_serve(args).await,
        Commands::Lookup(args) => commands::lookup::handle_lookup(args).await,
        Commands::Ask(args) => commands::ask::handle_ask(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
