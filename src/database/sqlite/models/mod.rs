#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::corpus::Chunk;
use crate::database::codec::{EncodingError, decode_embedding, encode_embedding};

/// A persisted chunk row
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ChunkRecord {
    pub id: i64,
    pub source: String,
    pub chunk_text: String,
    pub embedding: Vec<u8>,
}

impl ChunkRecord {
    /// Split the row back into its chunk and decoded embedding
    #[inline]
    pub fn into_parts(self) -> Result<(Chunk, Vec<f32>), EncodingError> {
        let embedding = decode_embedding(&self.embedding)?;
        Ok((
            Chunk {
                source: self.source,
                text: self.chunk_text,
            },
            embedding,
        ))
    }
}

/// A chunk row waiting to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChunkRecord {
    pub source: String,
    pub chunk_text: String,
    pub embedding: Vec<u8>,
}

impl NewChunkRecord {
    #[inline]
    pub fn from_chunk(chunk: &Chunk, embedding: &[f32]) -> Result<Self, EncodingError> {
        Ok(Self {
            source: chunk.source.clone(),
            chunk_text: chunk.text.clone(),
            embedding: encode_embedding(embedding)?,
        })
    }
}

/// Chunk count for one source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SourceSummary {
    pub source: String,
    pub chunk_count: i64,
}
