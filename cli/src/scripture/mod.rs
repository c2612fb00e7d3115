//! # Scripture Data and Lookup
//!
//! File: cli/src/scripture/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Everything that works directly on the verse dataset:
//! - `dataset`: loading and the immutable in-memory store
//! - `resolver`: chapter + verse list lookup with per-verse partial success
//! - `reference`: parsing `chapter.verse[,verse]` references from chat text
//! - `formatter`: rendering a verse into a chat message
//!
pub mod dataset;
pub mod formatter;
pub mod reference;
pub mod resolver;

pub use dataset::{Dataset, VerseEntry, VerseRecord};
