//! # gitabot Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the core infrastructure components that provide
//! foundational functionality for gitabot. These components handle
//! configuration, error management, and message templating.
//!
//! ## Architecture
//!
//! - `config`: Configuration loading, merging, and validation
//! - `error`: Error types and error handling utilities
//! - `templating`: Template compilation and rendering for chat messages
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{GitabotError, Result}; // For error handling
//! use crate::core::templating::TemplateRenderer; // For message rendering
//! ```
//!
pub mod config;
pub mod error;
pub mod templating;
