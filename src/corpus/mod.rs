// Corpus module
// Discovers documents on disk and splits them into overlapping windows

pub mod chunking;
pub mod loader;

use std::path::PathBuf;

pub use chunking::{ChunkingError, chunk_documents, chunk_text};
pub use loader::{LoadFailure, LoadReport, load_documents};

/// A corpus file read in full at ingestion time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub content: String,
}

impl Document {
    /// Base file name used as the source identifier of this document's chunks
    #[inline]
    pub fn source_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

/// The unit of indexing and retrieval
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    /// Base file name of the originating document
    pub source: String,
    pub text: String,
}
