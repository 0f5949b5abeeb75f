//! Embedding index
//!
//! Holds the chunk list and the embedding matrix side by side: row `i` of the
//! matrix always belongs to chunk `i`. The index is either rebuilt from the
//! corpus (when the store is empty) or reloaded from the store, never both.


use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::{ChunkingConfig, CorpusConfig};
use crate::corpus::{Chunk, LoadFailure, chunk_documents, load_documents};
use crate::database::Database;
use crate::database::sqlite::models::NewChunkRecord;
use crate::embeddings::{EmbeddingModel, dot, normalize};

/// Chunks paired 1:1 with their embeddings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
}

/// How an index came to exist in this process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOrigin {
    Loaded {
        rows: usize,
    },
    Built {
        documents: usize,
        chunks: usize,
        failures: Vec<LoadFailure>,
    },
}

/// Where documents come from and how they are windowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSource {
    pub root: PathBuf,
    pub extensions: Vec<String>,
    pub chunking: ChunkingConfig,
}

impl CorpusSource {
    #[inline]
    pub fn new(corpus: &CorpusConfig, chunking: ChunkingConfig) -> Self {
        Self {
            root: corpus.docs_dir.clone(),
            extensions: corpus.extensions.clone(),
            chunking,
        }
    }
}

impl EmbeddingIndex {
    /// Pair chunks with embeddings as given.
    ///
    /// Fails when the counts differ, the rows disagree on dimension, or a row
    /// holds NaN or infinity.
    #[inline]
    pub fn from_parts(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(anyhow::anyhow!(
                "Index has {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            ));
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        if let Some(row) = embeddings.iter().position(|e| e.len() != dimension) {
            return Err(anyhow::anyhow!(
                "Embedding {} has {} dimensions, expected {}",
                row,
                embeddings[row].len(),
                dimension
            ));
        }
        if !chunks.is_empty() && dimension == 0 {
            return Err(anyhow::anyhow!("Embedding model returned empty vectors"));
        }
        if let Some(row) = embeddings
            .iter()
            .position(|e| e.iter().any(|v| !v.is_finite()))
        {
            return Err(anyhow::anyhow!("Embedding {} contains non-finite values", row));
        }

        Ok(Self {
            chunks,
            embeddings,
            dimension,
        })
    }

    /// Embed all chunks with a single batched model call and normalize every row
    #[inline]
    pub fn build(chunks: Vec<Chunk>, model: &dyn EmbeddingModel) -> Result<Self> {
        if chunks.is_empty() {
            warn!("No chunks to index");
            return Ok(Self::default());
        }

        info!("Computing embeddings for {} chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut embeddings = model
            .embed_batch(&texts)
            .context("Failed to embed corpus chunks")?;
        embeddings.iter_mut().for_each(|e| normalize(e));

        Self::from_parts(chunks, embeddings)
    }

    /// Write every (source, text, embedding) row once, in chunk order
    #[inline]
    pub async fn persist(&self, database: &Database) -> Result<usize> {
        let records = self
            .chunks
            .iter()
            .zip(&self.embeddings)
            .map(|(chunk, embedding)| NewChunkRecord::from_chunk(chunk, embedding))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to encode embeddings")?;

        let inserted = database
            .insert_chunks(&records)
            .await
            .context("Failed to persist index")?;

        info!("Saved {} chunks to the index store", inserted);
        Ok(inserted)
    }

    /// Reconstruct the index from stored rows, in insertion order.
    /// Stored rows were normalized when they were built.
    #[inline]
    pub async fn load(database: &Database) -> Result<Self> {
        let rows = database.list_chunks().await?;
        debug!("Decoding {} stored chunks", rows.len());

        let mut chunks = Vec::with_capacity(rows.len());
        let mut embeddings = Vec::with_capacity(rows.len());

        for row in rows {
            let id = row.id;
            let (chunk, embedding) = row
                .into_parts()
                .with_context(|| format!("Stored chunk {} has a corrupt embedding", id))?;
            chunks.push(chunk);
            embeddings.push(embedding);
        }

        Self::from_parts(chunks, embeddings)
    }

    /// Load the persisted index, or build and persist it when the store is empty
    #[inline]
    pub async fn load_or_build(
        database: &Database,
        model: &dyn EmbeddingModel,
        corpus: &CorpusSource,
    ) -> Result<(Self, IndexOrigin)> {
        let count = database.count_chunks().await?;

        if count > 0 {
            info!("Loading {} chunks from the index store", count);
            let index = Self::load(database).await?;
            let rows = index.len();
            return Ok((index, IndexOrigin::Loaded { rows }));
        }

        info!(
            "Index store is empty, processing documents in {}",
            corpus.root.display()
        );

        let report = load_documents(&corpus.root, &corpus.extensions);
        let chunks = chunk_documents(&report.documents, &corpus.chunking)
            .context("Invalid chunking configuration")?;

        let index = Self::build(chunks, model)?;
        if !index.is_empty() {
            index.persist(database).await?;
        }

        let origin = IndexOrigin::Built {
            documents: report.documents.len(),
            chunks: index.len(),
            failures: report.failures,
        };
        Ok((index, origin))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding width, 0 for an empty index
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[inline]
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    #[inline]
    pub fn chunk(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    /// Inner product of `query` with every row, in chunk order
    #[inline]
    pub fn scores(&self, query: &[f32]) -> Result<Vec<f32>> {
        if !self.is_empty() && query.len() != self.dimension {
            return Err(anyhow::anyhow!(
                "Query embedding has {} dimensions, index has {}",
                query.len(),
                self.dimension
            ));
        }

        Ok(self.embeddings.iter().map(|row| dot(row, query)).collect())
    }
}
