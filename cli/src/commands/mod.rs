//! # gitabot Commands
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! One module per top-level subcommand. Each exposes a clap `Args` struct and
//! an async `handle_*` entry point that `main` dispatches to.
//!
//! - `serve`: the HTTP server (verse lookup API and WhatsApp webhook)
//! - `lookup`: structured verse lookup from the terminal
//! - `ask`: one chat message through the command router
//!
pub mod ask;
pub mod lookup;
pub mod serve;
