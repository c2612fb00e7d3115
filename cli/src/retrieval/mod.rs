//! # Mood and Semantic Verse Retrieval
//!
//! File: cli/src/retrieval/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Free-text input is resolved in two tiers, tried in order:
//! 1. **Mood tier**: if the trimmed, lower-cased input is a mood label, sample
//!    up to `limit` verses whose meaning contains one of the mood's keywords.
//!    Zero matches falls through to tier 2.
//! 2. **Semantic tier**: embed the input with the same model used for the
//!    verse index and return the `limit` nearest verses.
//!
//! The semantic tier is optional; without an embedder the retriever answers
//! [`Retrieval::Nothing`] when tier 1 yields nothing.
//!
pub mod embedding;
pub mod mood;

use crate::core::error::{GitabotError, Result};
use crate::scripture::dataset::{Dataset, VerseEntry};
use anyhow::anyhow;
use embedding::{Embedder, EmbeddingIndex};
use mood::MoodTable;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// An embedder paired with the index it built.
#[derive(Clone)]
pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    index: Arc<EmbeddingIndex>,
}

impl SemanticSearch {
    pub fn new(embedder: Arc<dyn Embedder>, index: EmbeddingIndex) -> Self {
        Self {
            embedder,
            index: Arc::new(index),
        }
    }

    /// Embeds `query` and returns up to `k` dataset entries, nearest first.
    pub async fn search<'a>(
        &self,
        dataset: &'a Dataset,
        query: &str,
        k: usize,
    ) -> Result<Vec<VerseEntry<'a>>> {
        let vectors = self.embedder.embed(&[query.to_string()]).await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!(GitabotError::Embedding("no vector for query".into())))?;
        Ok(self
            .index
            .nearest(&vector, k)
            .into_iter()
            .filter_map(|(chapter, verse, score)| {
                debug!("Semantic hit {}.{} (score {:.3})", chapter, verse, score);
                dataset.entry(chapter, verse)
            })
            .collect())
    }
}

/// Which tier produced the verses.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval<'a> {
    Mood(Vec<VerseEntry<'a>>),
    Semantic(Vec<VerseEntry<'a>>),
    Nothing,
}

/// Two-tier retriever. Shared read-only across requests.
#[derive(Clone)]
pub struct Retriever {
    moods: MoodTable,
    semantic: Option<SemanticSearch>,
    languages: Vec<String>,
    limit: usize,
}

impl Retriever {
    pub fn new(
        moods: MoodTable,
        semantic: Option<SemanticSearch>,
        languages: Vec<String>,
        limit: usize,
    ) -> Self {
        Self {
            moods,
            semantic,
            languages,
            limit,
        }
    }

    pub fn moods(&self) -> &MoodTable {
        &self.moods
    }

    pub fn has_semantic(&self) -> bool {
        self.semantic.is_some()
    }

    /// Tier 1 only. `None` when the input is not a mood or nothing matched.
    pub fn mood_tier<'a, R: Rng + ?Sized>(
        &self,
        dataset: &'a Dataset,
        input: &str,
        rng: &mut R,
    ) -> Option<Vec<VerseEntry<'a>>> {
        if !self.moods.is_mood(input) {
            return None;
        }
        let sample = self
            .moods
            .sample(input, dataset, &self.languages, self.limit, rng);
        if sample.is_empty() {
            debug!("Mood '{}' matched no verses; falling through", input.trim());
            None
        } else {
            Some(sample)
        }
    }

    /// Tier 2 only. `Ok(None)` when no embedder is configured.
    pub async fn semantic_tier<'a>(
        &self,
        dataset: &'a Dataset,
        input: &str,
    ) -> Result<Option<Vec<VerseEntry<'a>>>> {
        match &self.semantic {
            Some(search) => Ok(Some(search.search(dataset, input.trim(), self.limit).await?)),
            None => {
                warn!("Semantic search requested but no embedder is configured");
                Ok(None)
            }
        }
    }

    /// Both tiers in order.
    pub async fn retrieve<'a, R: Rng + Send>(
        &self,
        dataset: &'a Dataset,
        input: &str,
        rng: &mut R,
    ) -> Result<Retrieval<'a>> {
        if let Some(verses) = self.mood_tier(dataset, input, rng) {
            return Ok(Retrieval::Mood(verses));
        }
        match self.semantic_tier(dataset, input).await? {
            Some(verses) if !verses.is_empty() => Ok(Retrieval::Semantic(verses)),
            _ => Ok(Retrieval::Nothing),
        }
    }
}
