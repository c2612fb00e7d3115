//! # gitabot Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error types used throughout gitabot. It provides a
//! consistent approach to error management with detailed error information
//! and context.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `GitabotError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The error types cover various domains:
//! - Configuration and dataset loading errors
//! - Client input errors (missing parameters)
//! - Not-found conditions (chapter / verse)
//! - User-state persistence errors
//! - External dependency errors (embedding service, messaging API)
//! - Message template errors
//!
//! ## Examples
//!
//! ```rust,ignore
//! // Return a specific error type
//! if chapter.is_empty() {
//!     return Err(GitabotError::MissingParameters)?;
//! }
//!
//! // Pattern matching on error types (HTTP status mapping)
//! match err.downcast_ref::<GitabotError>() {
//!     Some(GitabotError::ChapterNotFound { .. }) => StatusCode::NOT_FOUND,
//!     Some(GitabotError::MissingParameters) => StatusCode::BAD_REQUEST,
//!     _ => StatusCode::INTERNAL_SERVER_ERROR,
//! }
//! ```
//!
use thiserror::Error;

/// Custom error type for the gitabot service.
#[derive(Error, Debug)]
pub enum GitabotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("chapter_number and verse_numbers are required")]
    MissingParameters,

    #[error("Chapter {chapter} not found")]
    ChapterNotFound { chapter: String },

    #[error("Verse {chapter}.{verse} not found")]
    VerseNotFound { chapter: String, verse: String },

    #[error("User state error: {0}")]
    State(String),

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Messaging API error: {0}")]
    Messaging(String),

    #[error("Template rendering error: {source}")]
    Template {
        #[from]
        source: tera::Error,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
/// Anyhow allows for easy context addition and flexible error handling.
pub type Result<T> = anyhow::Result<T>;
