//! # Chatbot
//!
//! File: cli/src/chat/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The conversational half of gitabot: command routing, per-user position
//! tracking and the WhatsApp adapter. [`build_router`] wires a [`ChatRouter`]
//! from the loaded configuration; both `gitabot serve` and `gitabot ask` use it.
//!
pub mod router;
pub mod state;
pub mod whatsapp;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::retrieval::embedding::{Embedder, EmbeddingIndex, HttpEmbedder};
use crate::retrieval::mood::MoodTable;
use crate::retrieval::{Retriever, SemanticSearch};
use crate::scripture::dataset::Dataset;
use crate::scripture::formatter::VerseFormatter;
use anyhow::Context;
use router::ChatRouter;
use state::UserStateStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Builds the router, using the HTTP embedder when `embedding.enabled` is set.
pub async fn build_router(config: &Config, dataset: Arc<Dataset>) -> Result<ChatRouter> {
    let embedder: Option<Arc<dyn Embedder>> = if config.embedding.enabled {
        Some(Arc::new(HttpEmbedder::new(&config.embedding)))
    } else {
        info!("Semantic search disabled (embedding.enabled = false)");
        None
    };
    build_router_with_embedder(config, dataset, embedder).await
}

/// Like [`build_router`] with an explicit embedder. If the verse index cannot
/// be built the bot keeps running without the semantic tier.
pub async fn build_router_with_embedder(
    config: &Config,
    dataset: Arc<Dataset>,
    embedder: Option<Arc<dyn Embedder>>,
) -> Result<ChatRouter> {
    let formatter = VerseFormatter::new(&config.bot.languages)?;
    let moods = match &config.moods {
        Some(map) => MoodTable::from_map(map.clone()),
        None => MoodTable::default(),
    };

    let semantic = match embedder {
        Some(embedder) => {
            match EmbeddingIndex::build(
                &dataset,
                &config.bot.languages,
                embedder.as_ref(),
                config.embedding.batch_size,
            )
            .await
            {
                Ok(index) => Some(SemanticSearch::new(embedder, index)),
                Err(e) => {
                    error!("Semantic search unavailable: {:#}", e);
                    None
                }
            }
        }
        None => None,
    };

    let state_path = Path::new(&config.state.path);
    let state = UserStateStore::load(state_path)
        .with_context(|| format!("Failed to load user state from {}", state_path.display()))?;

    let retriever = Retriever::new(
        moods,
        semantic,
        config.bot.languages.clone(),
        config.bot.results_per_query,
    );
    Ok(ChatRouter::new(
        dataset,
        formatter,
        retriever,
        Arc::new(state),
        config.bot.clone(),
    ))
}
