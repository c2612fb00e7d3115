//! # Ask Command
//!
//! File: cli/src/commands/ask.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `gitabot ask` sends one message through the chat router and prints the
//! reply, exactly as a WhatsApp user would receive it. User state is read from
//! and written to the configured state file, so `next` continues across runs.
//!
//! ## Examples
//!
//! ```bash
//! gitabot ask 2.47
//! gitabot ask next
//! gitabot ask --user alice I feel anxious
//! ```
//!
use super::lookup::dataset_path;
use crate::chat::build_router;
use crate::core::config::load_config;
use crate::core::error::Result;
use crate::scripture::dataset::Dataset;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// # Ask Command Arguments (`AskArgs`)
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Configuration file to use instead of the nearest `.gitabot.toml`.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Path of the scripture dataset JSON file.
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Path of the user-state JSON file.
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// User id whose position is tracked.
    #[arg(long, short, default_value = "local")]
    pub user: String,

    /// The message text; several words are joined with spaces.
    #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
    pub text: Vec<String>,
}

/// # Handle Ask Command (`handle_ask`)
///
/// ## Errors
///
/// Returns an error if the configuration, dataset or user state cannot be
/// loaded. Failures while answering become the bot's apology reply instead.
pub async fn handle_ask(args: AskArgs) -> Result<()> {
    info!("Handling ask command with args: {:?}", args);
    let mut config = load_config(args.config.as_deref())?;
    if let Some(path) = &args.state {
        config.state.path = path.display().to_string();
    }
    let dataset = Arc::new(Dataset::load(&dataset_path(&config, args.dataset.as_deref()))?);
    let router = build_router(&config, dataset).await?;
    let reply = router.respond(&args.user, &args.text.join(" ")).await;
    println!("{}", reply);
    Ok(())
}
