
use thiserror::Error;
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::corpus::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChunkingError {
    #[error("Chunk size must be greater than zero")]
    ZeroSize,
    #[error("Overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// Split `text` into windows of at most `size` characters whose starts are
/// `size - overlap` characters apart. Only the last window may be shorter.
#[inline]
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ChunkingError> {
    if size == 0 {
        return Err(ChunkingError::ZeroSize);
    }
    if overlap >= size {
        return Err(ChunkingError::OverlapTooLarge { size, overlap });
    }

    let chars: Vec<char> = text.chars().collect();
    let step = size - overlap;

    let mut windows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        windows.push(chars[start..end].iter().collect::<String>());
        // Anything after a window that reaches the end would be fully contained in it
        if end == chars.len() {
            break;
        }
        start += step;
    }

    Ok(windows)
}

/// Chunk every document in order, tagging each window with the file's base name
#[inline]
pub fn chunk_documents(
    documents: &[Document],
    config: &ChunkingConfig,
) -> Result<Vec<Chunk>, ChunkingError> {
    let mut chunks = Vec::new();

    for document in documents {
        let source = document.source_name();
        let windows = chunk_text(&document.content, config.chunk_size, config.overlap)?;

        debug!(
            "Split {} into {} chunks",
            document.path.display(),
            windows.len()
        );

        chunks.extend(windows.into_iter().map(|text| Chunk {
            source: source.clone(),
            text,
        }));
    }

    Ok(chunks)
}
