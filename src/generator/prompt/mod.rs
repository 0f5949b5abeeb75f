
use itertools::Itertools;

use crate::retriever::ScoredChunk;

/// Context text used when retrieval returns nothing
pub const NO_CONTEXT_MARKER: &str = "No relevant context found.";

/// Reply the model is told to give when the context lacks the answer
pub const NO_INFORMATION_REPLY: &str = "I don't have information on that.";

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Render retrieved chunks as `Source: <source>\n<text>` blocks in rank order
#[inline]
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT_MARKER.to_string();
    }

    chunks
        .iter()
        .map(|c| format!("Source: {}\n{}", c.chunk.source, c.chunk.text))
        .join(CONTEXT_SEPARATOR)
}

/// Assemble the grounded question prompt. Identical inputs give identical output.
#[inline]
pub fn build_prompt(query: &str, history: &str, chunks: &[ScoredChunk]) -> String {
    format!(
        "You are a helpful assistant for a financial institution.\n\
         Answer the user's question using ONLY the provided context below.\n\
         If the answer is not in the context, say \"{NO_INFORMATION_REPLY}\"\n\
         \n\
         Conversation History:\n\
         {history}\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {query}\n\
         Answer:",
        context = format_context(chunks),
    )
}

#[inline]
pub fn build_summary_prompt(transcript: &str) -> String {
    format!("Summarize the following conversation in 3 bullet points:\n\n{transcript}")
}
