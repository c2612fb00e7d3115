//! # Embedding-Based Verse Search
//!
//! File: cli/src/retrieval/embedding.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The semantic tier treats the embedding model as an external collaborator:
//! anything implementing [`Embedder`] turns text into vectors. At startup the
//! meaning text of every verse is embedded once into an [`EmbeddingIndex`];
//! queries are embedded with the same model and ranked by cosine similarity.
//!
//! ## Architecture
//!
//! - `Embedder`: async capability trait (`embed(texts) -> vectors`)
//! - `HttpEmbedder`: OpenAI-compatible `/embeddings` client built on `reqwest`
//! - `EmbeddingIndex`: (chapter, verse) keys in dataset order plus one vector each
//!
use crate::core::config::EmbeddingConfig;
use crate::core::error::{GitabotError, Result};
use crate::scripture::dataset::Dataset;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Text-to-vector capability supplied by an external model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns one vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| anyhow!(GitabotError::Embedding(e.to_string())))
            .context("Embedding request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(GitabotError::Embedding(format!(
                "endpoint returned {}: {}",
                status, body
            ))));
        }
        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| anyhow!(GitabotError::Embedding(e.to_string())))
            .context("Failed to decode embedding response")?;
        if parsed.data.len() != texts.len() {
            return Err(anyhow!(GitabotError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            ))));
        }
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Precomputed verse embeddings, read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    keys: Vec<(String, String)>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    /// Embeds the meaning text of every verse in dataset order, `batch_size`
    /// texts per call. Verses without meaning text are skipped.
    pub async fn build(
        dataset: &Dataset,
        languages: &[String],
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self> {
        let (keys, texts): (Vec<(String, String)>, Vec<String>) = dataset
            .iter()
            .filter_map(|entry| {
                let meaning = entry.record.meaning_text(languages);
                (!meaning.trim().is_empty())
                    .then(|| ((entry.chapter.to_string(), entry.verse.to_string()), meaning))
            })
            .unzip();

        let mut vectors = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(batch_size.max(1)).enumerate() {
            debug!("Embedding batch {} ({} verses)", i + 1, batch.len());
            let embedded = embedder
                .embed(batch)
                .await
                .with_context(|| format!("Failed to embed verse batch {}", i + 1))?;
            if embedded.len() != batch.len() {
                return Err(anyhow!(GitabotError::Embedding(format!(
                    "embedder returned {} vectors for {} texts",
                    embedded.len(),
                    batch.len()
                ))));
            }
            vectors.extend(embedded);
        }
        info!("Built embedding index over {} verses", keys.len());
        Ok(Self { keys, vectors })
    }

    /// Assembles an index from precomputed vectors (one per key).
    pub fn from_parts(keys: Vec<(String, String)>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if keys.len() != vectors.len() {
            return Err(anyhow!(GitabotError::Embedding(format!(
                "{} keys but {} vectors",
                keys.len(),
                vectors.len()
            ))));
        }
        Ok(Self { keys, vectors })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The `k` most similar verses, most similar first; ties keep index order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<(&str, &str, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| (self.keys[i].0.as_str(), self.keys[i].1.as_str(), score))
            .collect()
    }
}

/// Cosine similarity; 0.0 for mismatched dimensions or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_nan() {
        0.0
    } else {
        score
    }
}
