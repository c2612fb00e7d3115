//! # gitabot Library
//!
//! File: cli/src/lib.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! gitabot serves Bhagavad Gita verses over HTTP and WhatsApp. The library
//! holds everything the `gitabot` binary runs, so integration tests can build
//! the HTTP router and chat router directly.
//!
//! ## Architecture
//!
//! - `core`: configuration, error types and templating
//! - `scripture`: the verse dataset, lookup, reference parsing and formatting
//! - `retrieval`: mood-keyword and embedding-based verse search
//! - `chat`: command routing, per-user state and the WhatsApp adapter
//! - `commands`: the `serve`, `lookup` and `ask` subcommands
//!
pub mod chat;
pub mod commands;
pub mod core;
pub mod retrieval;
pub mod scripture;
