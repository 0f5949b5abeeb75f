//! Deterministic model doubles shared by unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::embeddings::{ChatError, ChatMessage, ChatModel, EmbeddingModel};

/// Bag-of-words embedder over a fixed vocabulary; unknown words share the last slot
pub(crate) struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub(crate) fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn finance() -> Self {
        Self::new(&["fixed", "income", "target", "is", "40", "equity", "60"])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.vocabulary.len() + 1];
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let slot = self
                .vocabulary
                .iter()
                .position(|known| *known == word)
                .unwrap_or(self.vocabulary.len());
            vector[slot] += 1.0;
        }
        vector
    }
}

impl EmbeddingModel for KeywordEmbedder {
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Embedder that always fails
pub(crate) struct FailingEmbedder;

impl EmbeddingModel for FailingEmbedder {
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("embedding service unreachable"))
    }
}

/// Embedder that returns the same vector for every text
pub(crate) struct ConstantEmbedder(pub(crate) Vec<f32>);

impl EmbeddingModel for ConstantEmbedder {
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }
}

/// Chat model that replays scripted outcomes and records every prompt it sees.
/// Once the script runs out it keeps returning the fallback outcome.
pub(crate) struct ScriptedChat {
    script: Mutex<VecDeque<Result<String, ChatError>>>,
    fallback: Result<String, ChatError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChat {
    pub(crate) fn always(outcome: Result<String, ChatError>) -> Self {
        Self::scripted(Vec::new(), outcome)
    }

    pub(crate) fn scripted(
        script: Vec<Result<String, ChatError>>,
        fallback: Result<String, ChatError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.prompts.lock().len()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl ChatModel for ScriptedChat {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().push(prompt);

        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
