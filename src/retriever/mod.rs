//! Similarity retrieval over the embedding index
//!
//! Scores are inner products between unit-length vectors, i.e. cosine
//! similarity. Ties are broken by chunk position, lower first.

pub mod cache;


use std::cmp::Ordering;
use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::debug;

use crate::corpus::Chunk;
use crate::embeddings::{EmbeddingModel, normalize};
use crate::index::EmbeddingIndex;

pub use cache::{CacheStats, RetrievalCache};

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// Position of the chunk in the index
    pub position: usize,
    pub score: f32,
    pub chunk: Chunk,
}

pub struct Retriever {
    index: Arc<EmbeddingIndex>,
    model: Arc<dyn EmbeddingModel>,
    cache: Mutex<RetrievalCache>,
}

impl Retriever {
    #[inline]
    pub fn new(
        index: Arc<EmbeddingIndex>,
        model: Arc<dyn EmbeddingModel>,
        cache_capacity: NonZeroUsize,
    ) -> Self {
        Self {
            index,
            model,
            cache: Mutex::new(RetrievalCache::new(cache_capacity)),
        }
    }

    #[inline]
    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Return up to `k` chunks ranked by descending similarity to `query`.
    ///
    /// An empty index or `k == 0` yields an empty result without calling the
    /// embedding model. Results are memoized per (query, k).
    #[inline]
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if let Some(cached) = self.cache.lock().get(query, k) {
            debug!("Retrieval cache hit for k={}", k);
            return Ok(cached);
        }

        let mut query_embedding = self
            .model
            .embed(query)
            .context("Failed to embed query")?;
        normalize(&mut query_embedding);
        if query_embedding.iter().any(|v| !v.is_finite()) {
            return Err(anyhow::anyhow!("Query embedding contains non-finite values"));
        }

        let results = self.rank(&query_embedding, k)?;

        debug!(
            "Retrieved {} chunks (best score {:?})",
            results.len(),
            results.first().map(|r| r.score)
        );

        self.cache.lock().insert(query, k, results.clone());
        Ok(results)
    }

    fn rank(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let scores = self.index.scores(query_embedding)?;

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_unstable_by(by_score_then_position);
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .filter_map(|(position, score)| {
                self.index.chunk(position).map(|chunk| ScoredChunk {
                    position,
                    score,
                    chunk: chunk.clone(),
                })
            })
            .collect())
    }

    #[inline]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }
}

/// Descending score, then ascending position. Total even for NaN scores.
fn by_score_then_position(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}
