// Shared fakes for the pipeline integration tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use mini_rag::embeddings::{ChatError, ChatMessage, ChatModel, EmbeddingModel};

/// Counts vocabulary words; everything else lands in a final catch-all slot
pub struct WordCountEmbedder {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
}

impl WordCountEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingModel for WordCountEmbedder {
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
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
            })
            .collect())
    }
}

/// Replies with a fixed text and keeps every prompt it was sent
pub struct RecordingChat {
    reply: Result<String, ChatError>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ChatError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log is not poisoned").clone()
    }
}

impl ChatModel for RecordingChat {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let mut prompts = self.prompts.lock().expect("prompt log is not poisoned");
        prompts.extend(messages.iter().map(|m| m.content.clone()));
        self.reply.clone()
    }
}
